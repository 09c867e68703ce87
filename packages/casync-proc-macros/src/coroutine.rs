use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};

/// Bail with a `syn::Error` spanning the tokens
macro_rules! bail {
    ($tokens:expr, $msg:expr) => {
        return Err(syn::Error::new_spanned($tokens, $msg))
    };
}

pub fn expand(attr: TokenStream, input: TokenStream) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        let attr = TokenStream2::from(attr);
        bail!(attr, "unknown attribute, #[casync::coroutine] takes no arguments");
    }
    let item: syn::ItemFn = syn::parse(input)?;
    let sig = &item.sig;
    if sig.asyncness.is_none() {
        bail!(sig.fn_token, "#[casync::coroutine] requires an async fn");
    }
    let retty = match &sig.output {
        syn::ReturnType::Default => bail!(sig, "coroutine must return a `casync::Result`"),
        syn::ReturnType::Type(_, ty) => ty,
    };

    let mut inputs = sig.inputs.iter();
    let (cx_pat, cx_ty) = match inputs.next() {
        Some(syn::FnArg::Typed(arg)) => (&arg.pat, &arg.ty),
        Some(syn::FnArg::Receiver(arg)) => {
            bail!(arg, "coroutine cannot take `self`, get the receiver from the context instead")
        }
        None => bail!(sig, "coroutine must take a `casync::Context` as the first parameter"),
    };
    let mut arg_pats = Vec::new();
    let mut arg_tys = Vec::new();
    for input in inputs {
        match input {
            syn::FnArg::Typed(arg) => {
                arg_pats.push(&arg.pat);
                arg_tys.push(&arg.ty);
            }
            syn::FnArg::Receiver(arg) => bail!(arg, "unexpected `self` parameter"),
        }
    }

    let params = arg_pats.len();
    let temps = (0..params)
        .map(|i| format_ident!("__casync_arg{i}"))
        .collect::<Vec<_>>();
    let attrs = &item.attrs;
    let vis = &item.vis;
    let ident = &sig.ident;
    let generics = &sig.generics;
    let where_clause = &generics.where_clause;
    let block = &item.block;

    // the body runs in its own async block, so `return` and `?`
    // leave the body, not the generated wrapper
    let expanded = quote! {
        #(#attrs)*
        #vis fn #ident #generics () -> casync::Coroutine<
            <#cx_ty as casync::__priv::Invocation>::This,
            <#cx_ty as casync::__priv::Invocation>::Value,
        > #where_clause {
            casync::Coroutine::new(#params, |mut __casync_cx: #cx_ty| async move {
                let [#(#temps),*] = casync::__priv::take_args::<_, _, #params>(&mut __casync_cx)?;
                #(let #arg_pats: #arg_tys = #temps;)*
                let #cx_pat = __casync_cx;
                let __casync_result: #retty = async move #block.await;
                __casync_result
            })
        }
    };

    Ok(expanded)
}
