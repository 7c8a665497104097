use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut fields_methods = Vec::new();
    let mut key_exprs = Vec::new();
    let mut to_values = Vec::new();
    let mut from_values = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let field_name = field_ident.to_string();

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #calmform::form::FieldKey {
                #calmform::form::FieldKey::new(#field_name)
            }
        });

        key_exprs.push(quote! {
            #calmform::form::FieldKey::new(#field_name)
        });

        to_values.push(quote! {
            values.insert(
                #calmform::form::FieldKey::new(#field_name),
                <#field_ty as #calmform::form::FieldType>::to_field_value(&self.#field_ident),
            );
        });

        from_values.push(quote! {
            #field_ident: <#field_ty as #calmform::form::FieldType>::from_field_value(
                values.get_or_null(#field_name),
            )
            .map_err(|reason| #calmform::form::ModelError::InvalidField {
                field: #calmform::form::FieldKey::new(#field_name),
                reason,
            })?,
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #calmform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> ::std::vec::Vec<#calmform::form::FieldKey> {
                ::std::vec![#(#key_exprs),*]
            }

            fn to_values(&self) -> #calmform::form::FormValues {
                let mut values = #calmform::form::FormValues::new();
                #(#to_values)*
                values
            }

            fn from_values(
                values: &#calmform::form::FormValues,
            ) -> ::std::result::Result<Self, #calmform::form::ModelError> {
                ::std::result::Result::Ok(Self {
                    #(#from_values)*
                })
            }
        }
    }
    .into()
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        // The crate root declares `extern crate self as calmform`, so the absolute path also
        // resolves inside its own unit and integration tests.
        Ok(FoundCrate::Itself) | Err(_) => quote!(::calmform),
    }
}
