use crate::decode_field::{FieldMetadata, decode_field};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Data, DataStruct, DeriveInput, Error, Expr, ExprLit, ExprTuple, Fields, Ident, Lit, LitInt,
    LitStr, Result, spanned::Spanned,
};

pub(crate) struct IndexMetadata {
    pub(crate) unique: bool,
    pub(crate) name: LitStr,
    pub(crate) columns: Vec<LitStr>,
}

pub(crate) struct TableMetadata {
    pub(crate) ident: Ident,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) name: Option<LitStr>,
    pub(crate) db: Option<LitStr>,
    pub(crate) engine: Option<LitStr>,
    pub(crate) charset: Option<LitStr>,
    pub(crate) comment: Option<LitStr>,
    pub(crate) auto_increment: Option<LitInt>,
    pub(crate) indexes: Vec<IndexMetadata>,
}

const INDEX_USAGE: &str = concat!(
    "Use it like: `#[keel(key = (\"idx_name\", \"column\"))]` ",
    "or `#[keel(unique = (\"idx_name\", (\"c1\", \"c2\")))]`",
);

fn string(expr: &Expr) -> Option<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(v), ..
        }) => Some(v.clone()),
        _ => None,
    }
}

fn decode_index(expr: Expr, unique: bool) -> Result<IndexMetadata> {
    let Expr::Tuple(ExprTuple { elems, .. }) = &expr else {
        return Err(Error::new(expr.span(), INDEX_USAGE));
    };
    let mut elems = elems.iter();
    let (Some(name), Some(columns), None) = (elems.next(), elems.next(), elems.next()) else {
        return Err(Error::new(expr.span(), INDEX_USAGE));
    };
    let name = string(name).ok_or_else(|| Error::new(name.span(), INDEX_USAGE))?;
    let columns = match columns {
        Expr::Tuple(ExprTuple { elems, .. }) => elems
            .iter()
            .map(|v| string(v).ok_or_else(|| Error::new(v.span(), INDEX_USAGE)))
            .collect::<Result<Vec<_>>>()?,
        v => vec![string(v).ok_or_else(|| Error::new(v.span(), INDEX_USAGE))?],
    };
    Ok(IndexMetadata {
        unique,
        name,
        columns,
    })
}

pub(crate) fn decode_table(input: &DeriveInput) -> Result<TableMetadata> {
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Model cannot be derived for generic types",
        ));
    }
    let Data::Struct(DataStruct {
        fields: Fields::Named(named),
        ..
    }) = &input.data
    else {
        return Err(Error::new(
            input.ident.span(),
            "Model can only be derived for structs with named fields",
        ));
    };
    let fields = named
        .named
        .iter()
        .map(decode_field)
        .collect::<Result<Vec<_>>>()?;
    let mut table = TableMetadata {
        ident: input.ident.clone(),
        fields,
        name: None,
        db: None,
        engine: None,
        charset: None,
        comment: None,
        auto_increment: None,
        indexes: Vec::new(),
    };
    for attr in input.attrs.iter().filter(|v| v.path().is_ident("keel")) {
        attr.parse_nested_meta(|arg| {
            let Some(key) = arg.path.get_ident().map(ToString::to_string) else {
                return Err(arg.error("Expected a single identifier"));
            };
            match key.as_str() {
                "name" => table.name = Some(arg.value()?.parse()?),
                "db" => table.db = Some(arg.value()?.parse()?),
                "engine" => table.engine = Some(arg.value()?.parse()?),
                "charset" => table.charset = Some(arg.value()?.parse()?),
                "comment" => table.comment = Some(arg.value()?.parse()?),
                "auto_increment" => table.auto_increment = Some(arg.value()?.parse()?),
                "key" | "unique" => {
                    let index = decode_index(arg.value()?.parse::<Expr>()?, key == "unique")?;
                    table.indexes.push(index);
                }
                _ => {
                    return Err(arg.error(format!(
                        "Unknown attribute `{}` inside keel macro",
                        arg.path.to_token_stream()
                    )));
                }
            }
            Ok(())
        })?;
    }
    let mut primary_keys = table.fields.iter().filter(|v| v.primary_key);
    match (primary_keys.next(), primary_keys.next()) {
        (Some(..), None) => {}
        (None, ..) => {
            return Err(Error::new(
                input.ident.span(),
                format!(
                    "Model `{}` must declare a primary key with `#[keel(primary_key)]` or `#[keel(auto)]`",
                    input.ident
                ),
            ));
        }
        (Some(..), Some(second)) => {
            return Err(Error::new(
                second.ident.span(),
                format!("Model `{}` declares more than one primary key", input.ident),
            ));
        }
    }
    Ok(table)
}

impl TableMetadata {
    /// `::keel::Table::builder(..)` chain producing the compiled table.
    pub(crate) fn encode_builder(&self) -> Result<TokenStream> {
        let class_name = self.ident.to_string();
        let mut chain = Vec::new();
        for (option, value) in [
            ("name", &self.name),
            ("db", &self.db),
            ("engine", &self.engine),
            ("charset", &self.charset),
            ("comment", &self.comment),
        ] {
            if let Some(value) = value {
                let option = Ident::new(option, value.span());
                chain.push(quote!(.#option(#value)));
            }
        }
        if let Some(seed) = &self.auto_increment {
            chain.push(quote!(.auto_increment(#seed)));
        }
        for field in &self.fields {
            let attribute = field.attribute();
            let definition = field.encode()?;
            chain.push(quote!(.field(#attribute, #definition)));
        }
        for index in &self.indexes {
            let name = &index.name;
            let columns = &index.columns;
            let constructor = if index.unique {
                quote!(unique)
            } else {
                quote!(key)
            };
            chain.push(quote!(.index(::keel::Index::#constructor(#name, [#(#columns),*]))));
        }
        Ok(quote!(::keel::Table::builder(#class_name) #(#chain)*))
    }
}
