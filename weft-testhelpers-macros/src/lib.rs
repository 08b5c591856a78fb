//! `#[weft_testhelpers::test]`: a `#[test]` that installs the weft test
//! subscriber before running its body.

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    // attributes and qualifiers, the name, then everything up to the body
    struct Signature {
        head: Any<Cons<Except<KFn>, TokenTree>>,
        _fn: KFn,
        name: Ident,
        rest: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        signature: Signature,
        body: BraceGroup,
    }
}

/// Marks a test that logs through the weft test subscriber.
///
/// ```ignore
/// #[weft_testhelpers::test]
/// fn builds_a_person() {
///     // tracing output from the writer shows up on failure
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    if !attr.is_empty() {
        return quote::quote! {
            ::core::compile_error!("#[weft_testhelpers::test] takes no arguments");
        }
        .into();
    }

    let item = TokenStream::from(item);
    let mut tokens = item.to_token_iter();
    let TestFn { signature, body } = match tokens.parse::<TestFn>() {
        Ok(decl) => decl,
        Err(err) => {
            let message = format!("#[weft_testhelpers::test] expects a function: {err}");
            return quote::quote! { ::core::compile_error!(#message); }.into();
        }
    };

    let head = signature.head.to_token_stream();
    let name = signature.name;
    let rest = signature.rest.to_token_stream();
    let body = body.0.stream();

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #head fn #name #rest {
            ::weft_testhelpers::setup();

            #body
        }
    }
    .into()
}
