use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ItemFn, LitStr, PatType, ReturnType, Type};

fn is_f64(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "f64")
            .unwrap_or(false),
        _ => false,
    }
}

/// Turns `fn name(a: f64, b: f64) -> f64 { .. }` into a registry adapter.
///
/// The annotated function is rewritten to take its operands as a slice and
/// return `Result<f64, EvaluationError>`, rejecting a slice of the wrong
/// length. A `Function` descriptor named after the function in upper case
/// (`atan2` becomes `ATAN2`) is emitted next to it, ready to be inserted
/// into a `FunctionRegistry`.
#[proc_macro_attribute]
pub fn registry_fn(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let fn_name = &input.sig.ident;
    let fn_args = &input.sig.inputs;
    let fn_body = &input.block;

    match &input.sig.output {
        ReturnType::Type(_, ty) if is_f64(ty) => {}
        _ => {
            return syn::Error::new_spanned(&input.sig, "registry functions must return f64")
                .to_compile_error()
                .into();
        }
    }

    let mut arg_extractions = Vec::new();

    for (i, arg) in fn_args.iter().enumerate() {
        let (pat, ty) = match arg {
            FnArg::Typed(PatType { pat, ty, .. }) => (pat, ty),
            FnArg::Receiver(receiver) => {
                return syn::Error::new_spanned(receiver, "registry functions cannot take self")
                    .to_compile_error()
                    .into();
            }
        };

        let arg_name = match **pat {
            syn::Pat::Ident(ref ident) => &ident.ident,
            _ => {
                return syn::Error::new_spanned(pat, "unsupported argument pattern")
                    .to_compile_error()
                    .into();
            }
        };

        if !is_f64(ty) {
            return syn::Error::new_spanned(ty, format!("argument '{}' must be f64", arg_name))
                .to_compile_error()
                .into();
        }

        arg_extractions.push(quote! {
            let #arg_name: f64 = args[#i];
        });
    }

    let arity = arg_extractions.len();
    let registered_name = LitStr::new(&fn_name.to_string(), Span::call_site());
    let descriptor = format_ident!("{}", fn_name.to_string().to_uppercase());

    let expanded = quote! {
        #(#attrs)*
        #vis fn #fn_name(args: &[f64]) -> ::std::result::Result<f64, crate::error::EvaluationError> {
            if args.len() != #arity {
                return Err(crate::error::EvaluationError::ArgumentCount {
                    name: #registered_name.to_string(),
                    expected: #arity,
                    got: args.len(),
                });
            }

            #(#arg_extractions)*

            Ok(#fn_body)
        }

        #vis const #descriptor: crate::functions::Function =
            crate::functions::Function::new(#registered_name, #arity, #fn_name);
    };

    TokenStream::from(expanded)
}
