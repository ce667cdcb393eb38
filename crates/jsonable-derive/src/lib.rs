use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, spanned::Spanned, Attribute, Data, DataEnum, DataStruct, DeriveInput, Expr,
    ExprLit, ExprUnary, Fields, FieldsNamed, Generics, Ident, Lit, Meta, Path, Type, UnOp,
};

/// Derives `Reflect`, `ToJsonable` and `FromJsonable`.
///
/// * named-field structs become records;
/// * single-field tuple structs are transparent;
/// * enums of unit variants become enumerations, encoded by member value;
/// * enums of single-field tuple variants become unions.
#[proc_macro_derive(Jsonable, attributes(jsonable))]
pub fn derive_jsonable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_derive(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_derive(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Jsonable types cannot borrow; hint: use owned fields such as String or Vec",
        ));
    }

    match &input.data {
        Data::Struct(data) => derive_struct(input, data),
        Data::Enum(data) => derive_enum(input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            input,
            "Jsonable does not support `union` items; hint: use an enum with single-field variants",
        )),
    }
}

#[derive(Default)]
struct ContainerAttrs {
    rename_all: Option<RenameRule>,
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
    default: Option<FieldDefault>,
}

enum FieldDefault {
    Trait,
    Path(Path),
}

#[derive(Default)]
struct VariantAttrs {
    rename: Option<String>,
    value: Option<MemberValue>,
}

#[derive(Clone, Copy)]
enum RenameRule {
    Camel,
    Snake,
    Pascal,
    Kebab,
    ScreamingSnake,
    Lower,
    Upper,
    ScreamingKebab,
}

enum MemberValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl MemberValue {
    fn tokens(&self) -> proc_macro2::TokenStream {
        match self {
            MemberValue::Str(value) => quote! { ::jsonable::Jsonable::from(#value) },
            MemberValue::Int(value) => {
                let lit = proc_macro2::Literal::i64_suffixed(*value);
                quote! { ::jsonable::Jsonable::from(#lit) }
            }
            MemberValue::Bool(value) => quote! { ::jsonable::Jsonable::from(#value) },
        }
    }
}

struct Impls<'a> {
    name: &'a Ident,
    generics: &'a Generics,
}

impl Impls<'_> {
    fn bounded(&self, bound: proc_macro2::TokenStream) -> syn::Result<Generics> {
        let mut generics = self.generics.clone();
        for param in generics.type_params_mut() {
            param.bounds.push(syn::parse2(bound.clone())?);
        }
        Ok(generics)
    }

    fn render(
        &self,
        reflect_body: proc_macro2::TokenStream,
        to_jsonable_body: proc_macro2::TokenStream,
        from_jsonable_body: proc_macro2::TokenStream,
    ) -> syn::Result<proc_macro2::TokenStream> {
        let name = self.name;
        let (_, ty_generics, _) = self.generics.split_for_impl();

        let reflect_generics = self.bounded(quote! { ::jsonable::Reflect })?;
        let (reflect_impl, _, reflect_where) = reflect_generics.split_for_impl();
        let to_generics = self.bounded(quote! { ::jsonable::ToJsonable })?;
        let (to_impl, _, to_where) = to_generics.split_for_impl();
        let from_generics = self.bounded(quote! { ::jsonable::FromJsonable })?;
        let (from_impl, _, from_where) = from_generics.split_for_impl();

        Ok(quote! {
            impl #reflect_impl ::jsonable::Reflect for #name #ty_generics #reflect_where {
                fn type_expr() -> ::jsonable::TypeExpr {
                    #reflect_body
                }
            }

            impl #to_impl ::jsonable::ToJsonable for #name #ty_generics #to_where {
                #to_jsonable_body
            }

            impl #from_impl ::jsonable::FromJsonable for #name #ty_generics #from_where {
                #from_jsonable_body
            }
        })
    }
}

fn derive_struct(input: &DeriveInput, data: &DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let impls = Impls {
        name: &input.ident,
        generics: &input.generics,
    };
    let container_attrs = parse_container_attrs(&input.attrs)?;

    match &data.fields {
        Fields::Named(fields) => derive_record(&impls, &container_attrs, fields),
        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
            let inner = &fields.unnamed[0].ty;
            derive_transparent(&impls, inner)
        }
        Fields::Unnamed(_) => Err(syn::Error::new_spanned(
            input,
            "Tuple structs with several fields are not supported; hint: use a named-field struct",
        )),
        Fields::Unit => Err(syn::Error::new_spanned(
            input,
            "Unit structs are not supported; hint: use a named-field struct or a unit-variant enum",
        )),
    }
}

fn derive_record(
    impls: &Impls<'_>,
    container_attrs: &ContainerAttrs,
    fields: &FieldsNamed,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut field_shapes = Vec::new();
    let mut encode_fields = Vec::new();
    let mut field_inits = Vec::new();

    for field in &fields.named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
        let attrs = parse_field_attrs(&field.attrs)?;

        if attrs.skip {
            field_inits.push(quote! { #ident: ::std::default::Default::default() });
            continue;
        }

        let ty = &field.ty;
        let wire_name = attrs.rename.clone().unwrap_or_else(|| {
            let name = ident.unraw().to_string();
            match container_attrs.rename_all {
                Some(rule) => apply_rename(rule, &name),
                None => name,
            }
        });
        let has_default = attrs.default.is_some();

        field_shapes.push(quote! {
            ::jsonable::reflect::FieldShape::new(#wire_name, ::jsonable::TypeRef::of::<#ty>())
                .with_default(#has_default)
        });
        encode_fields.push(quote! {
            ::jsonable::encode::encode_field(&mut map, #wire_name, &self.#ident)?;
        });
        field_inits.push(field_decode_tokens(ident, ty, &wire_name, &attrs));
    }

    let reflect_body = quote! {
        ::jsonable::TypeExpr::Record(::jsonable::reflect::RecordShape::new(::std::vec![
            #(#field_shapes),*
        ]))
    };

    let to_jsonable_body = quote! {
        fn to_jsonable(&self) -> ::std::result::Result<::jsonable::Jsonable, ::jsonable::NonJsonableValueError> {
            let mut map = ::jsonable::JsonableMap::new();
            #(#encode_fields)*
            ::std::result::Result::Ok(::jsonable::Jsonable::Map(map))
        }
    };

    let from_jsonable_body = quote! {
        #[allow(unused_mut, unused_variables)]
        fn decode(
            descriptor: &'static ::jsonable::TypeDescriptor,
            value: ::jsonable::Jsonable,
            cx: &mut ::jsonable::DecodeContext<'_>,
        ) -> ::std::result::Result<Self, ::jsonable::DecodeError> {
            let mut input = ::jsonable::decode::RecordInput::new(descriptor, value, cx)?;
            ::std::result::Result::Ok(Self {
                #(#field_inits),*
            })
        }
    };

    impls.render(reflect_body, to_jsonable_body, from_jsonable_body)
}

fn field_decode_tokens(
    ident: &Ident,
    ty: &Type,
    wire_name: &str,
    attrs: &FieldAttrs,
) -> proc_macro2::TokenStream {
    match &attrs.default {
        None => quote! {
            #ident: input.field::<#ty>(#wire_name, cx)?
        },
        Some(FieldDefault::Trait) => quote! {
            #ident: input.field_or_else::<#ty>(#wire_name, cx, ::std::default::Default::default)?
        },
        Some(FieldDefault::Path(path)) => quote! {
            #ident: input.field_or_else::<#ty>(#wire_name, cx, #path)?
        },
    }
}

fn derive_transparent(impls: &Impls<'_>, inner: &Type) -> syn::Result<proc_macro2::TokenStream> {
    let reflect_body = quote! {
        ::jsonable::TypeExpr::Indirect(::jsonable::TypeRef::of::<#inner>())
    };

    let to_jsonable_body = quote! {
        fn to_jsonable(&self) -> ::std::result::Result<::jsonable::Jsonable, ::jsonable::NonJsonableValueError> {
            ::jsonable::ToJsonable::to_jsonable(&self.0)
        }

        fn is_omitted(&self) -> bool {
            ::jsonable::ToJsonable::is_omitted(&self.0)
        }
    };

    let from_jsonable_body = quote! {
        fn decode(
            descriptor: &'static ::jsonable::TypeDescriptor,
            value: ::jsonable::Jsonable,
            cx: &mut ::jsonable::DecodeContext<'_>,
        ) -> ::std::result::Result<Self, ::jsonable::DecodeError> {
            <#inner as ::jsonable::FromJsonable>::decode(descriptor, value, cx).map(Self)
        }

        fn decode_null(
            descriptor: &'static ::jsonable::TypeDescriptor,
            cx: &mut ::jsonable::DecodeContext<'_>,
        ) -> ::std::result::Result<Self, ::jsonable::DecodeError> {
            <#inner as ::jsonable::FromJsonable>::decode_null(descriptor, cx).map(Self)
        }

        fn decode_absent() -> ::std::option::Option<Self> {
            <#inner as ::jsonable::FromJsonable>::decode_absent().map(Self)
        }
    };

    impls.render(reflect_body, to_jsonable_body, from_jsonable_body)
}

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let impls = Impls {
        name: &input.ident,
        generics: &input.generics,
    };
    let container_attrs = parse_container_attrs(&input.attrs)?;

    let all_unit = data
        .variants
        .iter()
        .all(|variant| matches!(variant.fields, Fields::Unit));
    let all_newtype = data
        .variants
        .iter()
        .all(|variant| matches!(&variant.fields, Fields::Unnamed(fields) if fields.unnamed.len() == 1));

    if all_unit {
        derive_unit_enum(&impls, &container_attrs, data)
    } else if all_newtype {
        derive_union(&impls, data)
    } else {
        Err(syn::Error::new_spanned(
            input,
            "Jsonable enums must have only unit variants or only single-field tuple variants; hint: wrap struct-like variant data in its own struct",
        ))
    }
}

fn derive_unit_enum(
    impls: &Impls<'_>,
    container_attrs: &ContainerAttrs,
    data: &DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut member_shapes = Vec::new();
    let mut encode_arms = Vec::new();
    let mut decode_arms = Vec::new();

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.unraw().to_string();
        let attrs = parse_variant_attrs(&variant.attrs)?;

        let value = match (attrs.value, &variant.discriminant) {
            (Some(value), _) => value,
            (None, Some((_, expr))) => MemberValue::Int(parse_int_expr(expr)?),
            (None, None) => MemberValue::Str(attrs.rename.unwrap_or_else(|| {
                match container_attrs.rename_all {
                    Some(rule) => apply_rename(rule, &variant_name),
                    None => variant_name.clone(),
                }
            })),
        };
        let value = value.tokens();

        member_shapes.push(quote! {
            ::jsonable::reflect::EnumMemberShape::new(#variant_name, #value)
        });
        encode_arms.push(quote! {
            Self::#variant_ident => ::std::result::Result::Ok(#value)
        });
        decode_arms.push(quote! {
            #variant_name => ::std::result::Result::Ok(Self::#variant_ident)
        });
    }

    let reflect_body = quote! {
        ::jsonable::TypeExpr::Enum(::jsonable::reflect::EnumShape::new(::std::vec![
            #(#member_shapes),*
        ]))
    };

    let to_jsonable_body = quote! {
        fn to_jsonable(&self) -> ::std::result::Result<::jsonable::Jsonable, ::jsonable::NonJsonableValueError> {
            match *self {
                #(#encode_arms,)*
            }
        }
    };

    let from_jsonable_body = quote! {
        fn decode(
            descriptor: &'static ::jsonable::TypeDescriptor,
            value: ::jsonable::Jsonable,
            cx: &mut ::jsonable::DecodeContext<'_>,
        ) -> ::std::result::Result<Self, ::jsonable::DecodeError> {
            match ::jsonable::decode::enum_member(descriptor, value, cx)? {
                #(#decode_arms,)*
                other => ::std::result::Result::Err(cx.error(
                    "enum",
                    ::std::option::Option::None,
                    ::std::format!("unknown member `{other}`"),
                )),
            }
        }
    };

    impls.render(reflect_body, to_jsonable_body, from_jsonable_body)
}

fn derive_union(impls: &Impls<'_>, data: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let mut alternatives = Vec::new();
    let mut encode_arms = Vec::new();
    let mut decode_arms = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        let attrs = parse_variant_attrs(&variant.attrs)?;
        if attrs.rename.is_some() || attrs.value.is_some() {
            return Err(syn::Error::new_spanned(
                variant,
                "rename and value only apply to unit variants; hint: union alternatives are matched by shape",
            ));
        }

        let variant_ident = &variant.ident;
        let inner = match &variant.fields {
            Fields::Unnamed(fields) => &fields.unnamed[0].ty,
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "expected a single-field tuple variant",
                ))
            }
        };

        alternatives.push(quote! { ::jsonable::TypeRef::of::<#inner>() });
        encode_arms.push(quote! {
            Self::#variant_ident(inner) => ::jsonable::ToJsonable::to_jsonable(inner)
        });
        decode_arms.push(quote! {
            #index => ::jsonable::decode::decode_value::<#inner>(alternative, value, cx)
                .map(Self::#variant_ident)
        });
    }

    let reflect_body = quote! {
        ::jsonable::TypeExpr::Union(::jsonable::reflect::UnionShape::new(::std::vec![
            #(#alternatives),*
        ]))
    };

    let to_jsonable_body = quote! {
        fn to_jsonable(&self) -> ::std::result::Result<::jsonable::Jsonable, ::jsonable::NonJsonableValueError> {
            match self {
                #(#encode_arms,)*
            }
        }
    };

    let from_jsonable_body = quote! {
        fn decode(
            descriptor: &'static ::jsonable::TypeDescriptor,
            value: ::jsonable::Jsonable,
            cx: &mut ::jsonable::DecodeContext<'_>,
        ) -> ::std::result::Result<Self, ::jsonable::DecodeError> {
            ::jsonable::decode::decode_union(descriptor, value, cx, |index, alternative, value, cx| {
                match index {
                    #(#decode_arms,)*
                    _ => ::std::result::Result::Err(cx.error(
                        "union",
                        ::std::option::Option::Some(value),
                        "alternative index out of range",
                    )),
                }
            })
        }

        fn decode_null(
            descriptor: &'static ::jsonable::TypeDescriptor,
            cx: &mut ::jsonable::DecodeContext<'_>,
        ) -> ::std::result::Result<Self, ::jsonable::DecodeError> {
            Self::decode(descriptor, ::jsonable::Jsonable::Null, cx)
        }
    };

    impls.render(reflect_body, to_jsonable_body, from_jsonable_body)
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("jsonable") {
            continue;
        }
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::NameValue(meta) if meta.path.is_ident("rename_all") => {
                    out.rename_all = Some(parse_rename_rule(&meta.value, meta.span())?);
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        meta,
                        "unsupported #[jsonable(...)] container attribute; hint: only rename_all is accepted here",
                    ))
                }
            }
        }
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("jsonable") {
            continue;
        }
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::NameValue(meta) if meta.path.is_ident("rename") => {
                    out.rename = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::NameValue(meta) if meta.path.is_ident("default") => {
                    let path = parse_string_expr(&meta.value, meta.span())?;
                    out.default = Some(FieldDefault::Path(syn::parse_str::<Path>(&path)?));
                }
                Meta::Path(path) if path.is_ident("default") => {
                    out.default = Some(FieldDefault::Trait);
                }
                Meta::Path(path) if path.is_ident("skip") => {
                    out.skip = true;
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        meta,
                        "unsupported #[jsonable(...)] field attribute; hint: use rename, default, default = \"path\" or skip",
                    ))
                }
            }
        }
    }
    Ok(out)
}

fn parse_variant_attrs(attrs: &[Attribute]) -> syn::Result<VariantAttrs> {
    let mut out = VariantAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("jsonable") {
            continue;
        }
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::NameValue(meta) if meta.path.is_ident("rename") => {
                    out.rename = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::NameValue(meta) if meta.path.is_ident("value") => {
                    out.value = Some(parse_member_value(&meta.value)?);
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        meta,
                        "unsupported #[jsonable(...)] variant attribute; hint: use rename or value",
                    ))
                }
            }
        }
    }
    Ok(out)
}

fn parse_meta_list(attr: &Attribute) -> syn::Result<Vec<Meta>> {
    let list = attr
        .parse_args_with(syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;
    Ok(list.into_iter().collect())
}

fn parse_string_expr(expr: &Expr, span: proc_macro2::Span) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        _ => Err(syn::Error::new(
            span,
            "expected string literal; hint: wrap the value in quotes",
        )),
    }
}

fn parse_int_expr(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse::<i64>(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_int_expr(expr).map(|value| -value),
        _ => Err(syn::Error::new_spanned(
            expr,
            "expected integer literal; hint: use #[jsonable(value = ...)] for computed values",
        )),
    }
}

fn parse_member_value(expr: &Expr) -> syn::Result<MemberValue> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(MemberValue::Str(s.value())),
        Expr::Lit(ExprLit {
            lit: Lit::Bool(b), ..
        }) => Ok(MemberValue::Bool(b.value())),
        _ => parse_int_expr(expr).map(MemberValue::Int).map_err(|_| {
            syn::Error::new_spanned(
                expr,
                "expected string, integer or boolean literal; hint: enum values must be scalars",
            )
        }),
    }
}

fn parse_rename_rule(expr: &Expr, span: proc_macro2::Span) -> syn::Result<RenameRule> {
    let value = parse_string_expr(expr, span)?;
    let rule = match value.as_str() {
        "camelCase" => RenameRule::Camel,
        "snake_case" => RenameRule::Snake,
        "PascalCase" => RenameRule::Pascal,
        "kebab-case" => RenameRule::Kebab,
        "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
        "lowercase" => RenameRule::Lower,
        "UPPERCASE" => RenameRule::Upper,
        "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
        _ => {
            return Err(syn::Error::new(span, "unsupported rename_all value"));
        }
    };
    Ok(rule)
}

fn apply_rename(rule: RenameRule, name: &str) -> String {
    use convert_case::{Case, Casing};
    let case = match rule {
        RenameRule::Camel => Case::Camel,
        RenameRule::Snake => Case::Snake,
        RenameRule::Pascal => Case::Pascal,
        RenameRule::Kebab => Case::Kebab,
        RenameRule::ScreamingSnake => Case::UpperSnake,
        RenameRule::Lower => Case::Lower,
        RenameRule::Upper => Case::Upper,
        RenameRule::ScreamingKebab => Case::UpperKebab,
    };
    name.to_case(case)
}
