use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Error, Expr, ExprLit, ExprTuple, Field, GenericArgument, Ident, Lit, LitBool, LitInt, LitStr,
    PathArguments, Result, Type, TypePath, meta::ParseNestedMeta, spanned::Spanned,
};

/// Storage declared through `varchar`, `char`, `text` or `decimal`, overriding
/// the one inferred from the Rust type.
pub(crate) enum Storage {
    Varchar(LitInt),
    Char(LitInt),
    Text,
    Decimal(LitInt, LitInt),
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Last path segment of the type, `Option` already removed.
    pub(crate) base: Ident,
    pub(crate) nullable: bool,
    pub(crate) name: Option<LitStr>,
    pub(crate) storage: Option<Storage>,
    pub(crate) primary_key: bool,
    pub(crate) auto: bool,
    pub(crate) unsigned: bool,
    pub(crate) zerofill: bool,
    pub(crate) utc: Option<LitBool>,
    pub(crate) length: Option<LitInt>,
    pub(crate) charset: Option<LitStr>,
    pub(crate) comment: Option<LitStr>,
    pub(crate) default: Option<Expr>,
    pub(crate) default_raw: Option<LitStr>,
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(TypePath { qself: None, path }) => path.segments.last(),
        _ => None,
    }
}

/// Splits `Option<T>` into `(T, true)`.
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Some(segment) = last_segment(ty) {
        if segment.ident == "Option" {
            if let PathArguments::AngleBracketed(arguments) = &segment.arguments {
                if let Some(GenericArgument::Type(inner)) = arguments.args.first() {
                    return (inner, true);
                }
            }
        }
    }
    (ty, false)
}

fn flag(arg: &ParseNestedMeta, name: &str) -> Result<()> {
    if arg.input.peek(syn::Token![=]) {
        return Err(arg.error(format!(
            "`{name}` does not take a value, use it like: `#[keel({name})]`"
        )));
    }
    Ok(())
}

fn pair(expr: &Expr, usage: &str) -> Result<(LitInt, LitInt)> {
    let Expr::Tuple(ExprTuple { elems, .. }) = expr else {
        return Err(Error::new(expr.span(), usage));
    };
    let items = elems
        .iter()
        .map(|v| match v {
            Expr::Lit(ExprLit {
                lit: Lit::Int(v), ..
            }) => Ok(v.clone()),
            v => Err(Error::new(v.span(), usage)),
        })
        .collect::<Result<Vec<_>>>()?;
    match <[LitInt; 2]>::try_from(items) {
        Ok([precision, scale]) => Ok((precision, scale)),
        Err(..) => Err(Error::new(expr.span(), usage)),
    }
}

pub(crate) fn decode_field(field: &Field) -> Result<FieldMetadata> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| Error::new(field.span(), "Model fields must be named"))?;
    let (inner, nullable) = unwrap_option(&field.ty);
    let base = last_segment(inner)
        .map(|v| v.ident.clone())
        .ok_or_else(|| Error::new(field.ty.span(), "Unsupported field type"))?;
    let mut metadata = FieldMetadata {
        ident,
        ty: field.ty.clone(),
        base,
        nullable,
        name: None,
        storage: None,
        primary_key: false,
        auto: false,
        unsigned: false,
        zerofill: false,
        utc: None,
        length: None,
        charset: None,
        comment: None,
        default: None,
        default_raw: None,
    };
    for attr in field.attrs.iter().filter(|v| v.path().is_ident("keel")) {
        attr.parse_nested_meta(|arg| {
            let Some(key) = arg.path.get_ident().map(ToString::to_string) else {
                return Err(arg.error("Expected a single identifier"));
            };
            match key.as_str() {
                "primary_key" => {
                    flag(&arg, &key)?;
                    metadata.primary_key = true;
                }
                "auto" => {
                    flag(&arg, &key)?;
                    metadata.primary_key = true;
                    metadata.auto = true;
                }
                "unsigned" => {
                    flag(&arg, &key)?;
                    metadata.unsigned = true;
                }
                "zerofill" => {
                    flag(&arg, &key)?;
                    metadata.zerofill = true;
                }
                "text" => {
                    flag(&arg, &key)?;
                    metadata.storage = Some(Storage::Text);
                }
                "utc" => {
                    metadata.utc = Some(if arg.input.peek(syn::Token![=]) {
                        arg.value()?.parse::<LitBool>()?
                    } else {
                        LitBool::new(true, arg.path.span())
                    });
                }
                "name" => metadata.name = Some(arg.value()?.parse()?),
                "varchar" => metadata.storage = Some(Storage::Varchar(arg.value()?.parse()?)),
                "char" => metadata.storage = Some(Storage::Char(arg.value()?.parse()?)),
                "decimal" => {
                    let (precision, scale) = pair(
                        &arg.value()?.parse::<Expr>()?,
                        "Use it like: `#[keel(decimal = (10, 2))]`",
                    )?;
                    metadata.storage = Some(Storage::Decimal(precision, scale));
                }
                "length" => metadata.length = Some(arg.value()?.parse()?),
                "charset" => metadata.charset = Some(arg.value()?.parse()?),
                "comment" => metadata.comment = Some(arg.value()?.parse()?),
                "default" => metadata.default = Some(arg.value()?.parse()?),
                "default_raw" => metadata.default_raw = Some(arg.value()?.parse()?),
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
    if metadata.default.is_some() && metadata.default_raw.is_some() {
        return Err(Error::new(
            field.span(),
            "`default` and `default_raw` cannot be used together",
        ));
    }
    if metadata.primary_key && metadata.nullable {
        return Err(Error::new(
            field.ty.span(),
            "The primary key cannot be an Option",
        ));
    }
    Ok(metadata)
}

impl FieldMetadata {
    pub(crate) fn attribute(&self) -> String {
        self.ident.to_string()
    }

    fn is_integer(&self) -> bool {
        matches!(
            self.base.to_string().as_str(),
            "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize"
        )
    }

    /// `Field` constructor matching the Rust type, or the declared storage.
    fn constructor(&self) -> Result<(TokenStream, bool)> {
        if let Some(storage) = &self.storage {
            let text = matches!(self.base.to_string().as_str(), "String");
            let decimal = matches!(self.base.to_string().as_str(), "Decimal");
            return match storage {
                Storage::Varchar(n) if text => Ok((quote!(varchar(#n)), false)),
                Storage::Char(n) if text => Ok((quote!(char(#n)), false)),
                Storage::Text if text => Ok((quote!(text()), false)),
                Storage::Decimal(p, s) if decimal => Ok((quote!(decimal(#p, #s)), false)),
                _ => Err(Error::new(
                    self.ty.span(),
                    format!("The storage declared for `{}` does not fit its type", self.ident),
                )),
            };
        }
        Ok(match self.base.to_string().as_str() {
            "i8" => (quote!(tinyint()), false),
            "i16" => (quote!(smallint()), false),
            "i32" => (quote!(int()), false),
            "i64" | "isize" => (quote!(bigint()), false),
            "u8" => (quote!(tinyint()), true),
            "u16" => (quote!(smallint()), true),
            "u32" => (quote!(int()), true),
            "u64" | "usize" => (quote!(bigint()), true),
            "bool" => (quote!(boolean()), false),
            "f32" => (quote!(float()), false),
            "f64" => (quote!(double()), false),
            "Decimal" => (quote!(decimal(10, 0)), false),
            "String" => (quote!(varchar(255)), false),
            "Date" => (quote!(date()), false),
            "Time" => (quote!(time()), false),
            "PrimitiveDateTime" => (quote!(datetime()), false),
            "OffsetDateTime" => (quote!(timestamp()), false),
            "Uuid" => (quote!(uuid()), false),
            other => {
                return Err(Error::new(
                    self.ty.span(),
                    format!("Type `{other}` cannot be mapped to a column"),
                ));
            }
        })
    }

    /// Expression building the `::keel::Field` of this attribute.
    pub(crate) fn encode(&self) -> Result<TokenStream> {
        let (constructor, unsigned) = self.constructor()?;
        if self.auto && (self.storage.is_some() || !self.is_integer()) {
            return Err(Error::new(
                self.ty.span(),
                "An auto-increment primary key must be an integer",
            ));
        }
        let mut chain = Vec::new();
        if let Some(name) = &self.name {
            chain.push(quote!(.name(#name)));
        }
        if self.nullable {
            chain.push(quote!(.nullable()));
        }
        if self.primary_key {
            chain.push(quote!(.primary_key()));
        }
        if self.auto {
            chain.push(quote!(.auto_increment()));
        }
        if unsigned || self.unsigned {
            chain.push(quote!(.unsigned()));
        }
        if self.zerofill {
            chain.push(quote!(.zerofill()));
        }
        if let Some(length) = &self.length {
            chain.push(quote!(.length(#length)));
        }
        if let Some(utc) = &self.utc {
            chain.push(quote!(.utc(#utc)));
        }
        if let Some(charset) = &self.charset {
            chain.push(quote!(.charset(#charset)));
        }
        if let Some(comment) = &self.comment {
            chain.push(quote!(.comment(#comment)));
        }
        if let Some(default) = &self.default {
            chain.push(quote!(.default(#default)));
        }
        if let Some(default_raw) = &self.default_raw {
            chain.push(quote!(.default_raw(#default_raw)));
        }
        Ok(quote!(::keel::Field::#constructor #(#chain)*))
    }
}
