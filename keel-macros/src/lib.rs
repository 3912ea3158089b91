mod decode_field;
mod decode_table;

use decode_table::{TableMetadata, decode_table};
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DeriveInput, LitStr, Result, parse_macro_input};

/// Declares a table from a struct.
///
/// ```ignore
/// #[derive(Model)]
/// #[keel(name = "user", key = ("idx_name", "name"))]
/// struct User {
///     #[keel(auto)]
///     id: i64,
///     #[keel(varchar = 45)]
///     name: Option<String>,
///     #[keel(default = 18, unsigned)]
///     age: i32,
/// }
/// ```
#[proc_macro_derive(Model, attributes(keel))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match decode_table(&input).and_then(|table| encode_model(&table)) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn encode_model(table: &TableMetadata) -> Result<proc_macro2::TokenStream> {
    let name = &table.ident;
    let builder = table.encode_builder()?;
    let class_name = LitStr::new(&name.to_string(), Span::call_site());
    let idents: Vec<_> = table.fields.iter().map(|v| &v.ident).collect();
    let types: Vec<_> = table.fields.iter().map(|v| &v.ty).collect();
    let attributes: Vec<_> = table.fields.iter().map(|v| v.attribute()).collect();
    let accessors = table.fields.iter().map(|field| {
        let ident = &field.ident;
        let attribute = field.attribute();
        let doc = format!("Column bound to `{attribute}`.");
        quote! {
            #[doc = #doc]
            pub fn #ident() -> ::keel::Column {
                match <Self as ::keel::Model>::table().column(#attribute) {
                    Ok(column) => column,
                    Err(error) => panic!("{:#}", error),
                }
            }
        }
    });
    // An auto-increment key left at its default value is assigned by the server,
    // an optional field with a declared default falls back to it when `None`
    let count = table.fields.len();
    let insert_value = |owned: bool| {
        let read = table.fields.iter().map(move |field| {
            let ident = &field.ident;
            let attribute = field.attribute();
            let value = if owned {
                quote!(self.#ident)
            } else {
                quote!(::std::clone::Clone::clone(&self.#ident))
            };
            if field.auto {
                quote! {
                    if self.#ident != ::std::default::Default::default() {
                        values.insert(#attribute.into(), ::keel::Value::from(#value));
                    }
                }
            } else if field.nullable && (field.default.is_some() || field.default_raw.is_some()) {
                quote! {
                    if self.#ident.is_some() {
                        values.insert(#attribute.into(), ::keel::Value::from(#value));
                    }
                }
            } else {
                quote!(values.insert(#attribute.into(), ::keel::Value::from(#value));)
            }
        });
        quote! {
            let mut values = ::keel::Values::with_capacity(#count);
            #(#read)*
            values
        }
    };
    let owned = insert_value(true);
    let borrowed = insert_value(false);
    Ok(quote! {
        impl #name {
            #(#accessors)*
        }

        impl ::keel::Model for #name {
            fn table() -> ::std::sync::Arc<::keel::Table> {
                static TABLE: ::std::sync::LazyLock<::std::sync::Arc<::keel::Table>> =
                    ::std::sync::LazyLock::new(|| match #builder.build() {
                        Ok(table) => ::std::sync::Arc::new(table),
                        Err(error) => panic!("Invalid declaration of `{}`: {:#}", #class_name, error),
                    });
                ::std::sync::Arc::clone(&TABLE)
            }
        }

        impl ::keel::FromRecord for #name {
            fn from_record(mut record: ::keel::Record) -> ::keel::Result<Self> {
                Ok(Self {
                    #(
                        #idents: <#types as ::keel::AsValue>::try_from_value(record.take(#attributes))
                            .map_err(|error| error.context(format!(
                                "Cannot read `{}` of `{}`",
                                #attributes,
                                #class_name,
                            )))?,
                    )*
                })
            }
        }

        impl ::keel::IntoValues for #name {
            fn into_values(self) -> ::keel::Values {
                #owned
            }
        }

        impl ::keel::IntoValues for &#name {
            fn into_values(self) -> ::keel::Values {
                #borrowed
            }
        }
    })
}
