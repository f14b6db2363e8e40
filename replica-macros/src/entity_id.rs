use crate::utils::{apply_derives, expect_bool, parse_args};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

/// #[entity_id] 宏实现
/// 仅支持单字段 tuple struct，并为包装类型：
/// - 合并/追加派生：Clone, Debug（可关闭）, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash
/// - 提供 new(value)、value()、Display、FromStr、AsRef、From 等便捷实现
/// - 实现 `::replica_domain::entity::Identity`；`sequential` 时额外实现 `SequentialIdentity`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityIdAttrConfig);
    let input = parse_macro_input!(item as Item);

    let st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity_id] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let inner_ty = match &st.fields {
        syn::Fields::Unnamed(f) if f.unnamed.len() == 1 => f.unnamed[0].ty.clone(),
        syn::Fields::Unnamed(f) => {
            return syn::Error::new(
                f.span(),
                "#[entity_id] requires a tuple struct with exactly one field",
            )
            .to_compile_error()
            .into();
        }
        _ => {
            return syn::Error::new(
                st.span(),
                "#[entity_id] supports only tuple struct, e.g., struct MemberId(i64);",
            )
            .to_compile_error()
            .into();
        }
    };

    let mut st_out = st.clone();
    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
        syn::parse_quote!(PartialOrd),
        syn::parse_quote!(Ord),
        syn::parse_quote!(Hash),
    ];
    if cfg.derive_debug {
        required.insert(1, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st_out.attrs, required);

    let ident = &st_out.ident;

    let sequential = if cfg.sequential {
        quote! {
            impl ::replica_domain::entity::SequentialIdentity for #ident {
                fn from_sequence(value: i64) -> Self {
                    Self(::core::convert::From::from(value))
                }
            }
        }
    } else {
        quote! {}
    };

    let out = quote! {
        #st_out

        impl #ident {
            pub fn new(value: #inner_ty) -> Self { Self(value) }

            pub fn value(&self) -> &#inner_ty { &self.0 }
        }

        impl ::std::str::FromStr for #ident {
            type Err = <#inner_ty as ::std::str::FromStr>::Err;
            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let inner: #inner_ty = s.parse()?;
                ::std::result::Result::Ok(Self(inner))
            }
        }

        impl ::std::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }

        impl ::core::convert::AsRef<#inner_ty> for #ident {
            fn as_ref(&self) -> &#inner_ty { &self.0 }
        }

        impl ::core::convert::From<#inner_ty> for #ident {
            fn from(value: #inner_ty) -> Self { Self(value) }
        }

        impl ::core::convert::From<#ident> for #inner_ty {
            fn from(value: #ident) -> Self { value.0 }
        }

        impl ::replica_domain::entity::Identity for #ident {}

        #sequential
    };

    TokenStream::from(out)
}

// -------- parsing --------

struct EntityIdAttrConfig {
    derive_debug: bool,
    sequential: bool,
}

impl Parse for EntityIdAttrConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut derive_debug: Option<bool> = None;
        let mut sequential = false;

        for arg in parse_args(input)? {
            match (arg.key.to_string().as_str(), &arg.value) {
                ("sequential", None) => sequential = true,
                ("sequential", Some(v)) => sequential = expect_bool(&arg.key, v)?,
                ("debug", Some(v)) => {
                    if derive_debug.is_some() {
                        return Err(syn::Error::new(
                            arg.key.span(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    derive_debug = Some(expect_bool(&arg.key, v)?);
                }
                _ => {
                    return Err(syn::Error::new(
                        arg.key.span(),
                        "unknown key in attribute; expected 'sequential' or 'debug'",
                    ));
                }
            }
        }

        Ok(Self {
            derive_debug: derive_debug.unwrap_or(true),
            sequential,
        })
    }
}
