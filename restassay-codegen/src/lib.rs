use proc_macro::TokenStream;
use quote::quote;
use quote::quote_spanned;
use syn::spanned::Spanned;

/// Turns a function returning `Result<Scenario, Error>` into a `#[test]` that runs the
/// scenario and panics with the report unless it passed. An optional argument names a
/// `fn(&mut RunnerConfiguration)` applied before the run.
#[proc_macro_attribute]
pub fn scenario_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    let attributes = &input.attrs;
    let visibility = &input.vis;
    let name = &input.sig.ident;
    let return_type = &input.sig.output;
    let block = &input.block;

    if let Err(stream) = validate_signature(&input.sig) {
        return stream.into();
    }

    if args.len() > 1 {
        return quote! {
            compile_error!("Only a configuration function may be passed to the macro");
        }
        .into();
    }

    let configure = match args.first() {
        None => quote! {},
        Some(syn::NestedMeta::Meta(syn::Meta::Path(function_path))) => quote! {
            #function_path(&mut __restassay_configuration);
        },
        Some(_) => {
            return quote! {
                compile_error!("The argument should be a configuration function!");
            }
            .into();
        }
    };

    let output = quote! {
        #[test]
        #(#attributes)*
        #visibility fn #name() {
            fn __restassay_scenario() #return_type #block

            #[allow(unused_mut)]
            let mut __restassay_configuration = restassay::RunnerConfiguration::default();
            #configure
            let __restassay_report =
                restassay::TestSession::run(stringify!(#name), __restassay_configuration, __restassay_scenario());

            if !__restassay_report.is_passed() {
                panic!("{}", __restassay_report);
            }
        }
    };

    TokenStream::from(output)
}

fn validate_signature(signature: &syn::Signature) -> Result<(), proc_macro2::TokenStream> {
    if !signature.inputs.is_empty() {
        let span = signature.inputs.span();
        return Err(quote_spanned! {span=>
            compile_error!("A scenario function takes no arguments!");
        });
    }

    if signature.asyncness.is_some() {
        let span = signature.span();
        return Err(quote_spanned! {span=>
            compile_error!("A scenario function should not be async, the session runs it!");
        });
    }

    if let syn::ReturnType::Default = signature.output {
        let span = signature.span();
        return Err(quote_spanned! {span=>
            compile_error!("A scenario function should return Result<Scenario, Error>!");
        });
    }

    Ok(())
}
