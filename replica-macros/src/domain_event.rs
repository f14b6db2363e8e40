use crate::utils::{apply_derives, parse_args};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Expr, Item, parse_macro_input};

/// #[domain_event] 宏实现
/// - 仅支持具名字段结构体（事件即快照，字段须为扁平可序列化值）
/// - 合并派生：Debug, Clone, PartialEq, Serialize, Deserialize
/// - 生成 `::replica_domain::domain_event::DomainEvent` 实现（KIND/VERSION）
/// - 参数：`kind = "..."`（必填），`version = N`（默认 1）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let st = match &mut input {
        Item::Struct(st) if matches!(st.fields, syn::Fields::Named(_)) => st,
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on named-field structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let Some(kind) = cfg.kind else {
        return syn::Error::new(
            st.ident.span(),
            "#[domain_event] requires `kind = \"...\"`",
        )
        .to_compile_error()
        .into();
    };
    let version = cfg.version.unwrap_or_else(|| syn::parse_quote! { 1 });

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let out = quote! {
        #st

        impl #impl_generics ::replica_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            const KIND: &'static str = #kind;
            const VERSION: usize = #version;
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

struct EventAttrConfig {
    kind: Option<syn::LitStr>,
    version: Option<syn::LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut kind: Option<syn::LitStr> = None;
        let mut version: Option<syn::LitInt> = None;

        for arg in parse_args(input)? {
            match (arg.key.to_string().as_str(), arg.value) {
                (
                    "kind",
                    Some(Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit),
                        ..
                    })),
                ) => {
                    if kind.is_some() {
                        return Err(syn::Error::new(
                            arg.key.span(),
                            "duplicate key 'kind' in attribute",
                        ));
                    }
                    kind = Some(lit);
                }
                (
                    "version",
                    Some(Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Int(lit),
                        ..
                    })),
                ) => {
                    if version.is_some() {
                        return Err(syn::Error::new(
                            arg.key.span(),
                            "duplicate key 'version' in attribute",
                        ));
                    }
                    version = Some(lit);
                }
                ("kind", _) => {
                    return Err(syn::Error::new(
                        arg.key.span(),
                        "expected string literal for 'kind'",
                    ));
                }
                ("version", _) => {
                    return Err(syn::Error::new(
                        arg.key.span(),
                        "expected integer literal for 'version'",
                    ));
                }
                _ => {
                    return Err(syn::Error::new(
                        arg.key.span(),
                        "unknown key; expected 'kind' | 'version'",
                    ));
                }
            }
        }

        Ok(Self { kind, version })
    }
}
