use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

mod coroutine;

/// Declare a coroutine from an `async fn`.
///
/// The first parameter is the `casync::Context`. The remaining parameters
/// are the data parameters, and their count becomes the declared parameter
/// count. The function must return a `casync::Result`.
///
/// ```rust,ignore
/// #[casync::coroutine]
/// async fn add(cx: casync::Context<(), i64>, a: i64, b: i64) -> casync::Result<i64> {
///     cx.next()?.ok(a + b)?;
///     let sum = cx.suspend().await?.into_single()?;
///     Ok(sum)
/// }
///
/// let add = casync::wrap(add(), casync::Options::default());
/// assert_eq!(add.params(), 2);
/// ```
///
/// The function is replaced by a function with the same name, taking no
/// parameters and returning the `casync::Coroutine` definition.
#[proc_macro_attribute]
pub fn coroutine(attr: TokenStream, input: TokenStream) -> TokenStream {
    unwrap_syn(coroutine::expand(attr, input))
}

fn unwrap_syn<T: Into<TokenStream2>>(result: syn::Result<T>) -> TokenStream {
    match result {
        Ok(x) => <T as Into<TokenStream2>>::into(x).into(),
        Err(e) => e.into_compile_error().into(),
    }
}
