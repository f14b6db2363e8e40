use crate::utils::{apply_derives, expect_bool, parse_args};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

/// #[value_object] 宏实现
/// - 支持结构体（具名或 tuple）与枚举
/// - 合并/追加派生：Clone, PartialEq, Eq, Serialize, Deserialize
/// - 参数：`debug`（默认 true）、`default`（默认 true）、`copy`（默认 false）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ValueObjectAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
    ];
    if cfg.derive_default {
        required.insert(0, syn::parse_quote!(Default));
    }
    if cfg.derive_debug {
        required.insert(0, syn::parse_quote!(Debug));
    }
    if cfg.derive_copy {
        required.push(syn::parse_quote!(Copy));
    }

    match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);
            TokenStream::from(quote! { #st })
        }
        Item::Enum(en) => {
            apply_derives(&mut en.attrs, required);
            TokenStream::from(quote! { #en })
        }
        other => syn::Error::new(other.span(), "#[value_object] only supports struct or enum")
            .to_compile_error()
            .into(),
    }
}

// -------- parsing --------

struct ValueObjectAttrConfig {
    derive_debug: bool,
    derive_default: bool,
    derive_copy: bool,
}

impl Parse for ValueObjectAttrConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut cfg = Self {
            derive_debug: true,
            derive_default: true,
            derive_copy: false,
        };
        let mut seen = std::collections::HashSet::new();

        for arg in parse_args(input)? {
            let key = arg.key.to_string();
            if !seen.insert(key.clone()) {
                return Err(syn::Error::new(
                    arg.key.span(),
                    format!("duplicate key '{key}' in attribute"),
                ));
            }
            let Some(value) = &arg.value else {
                return Err(syn::Error::new(
                    arg.key.span(),
                    format!("expected '{key} = true|false'"),
                ));
            };
            let flag = expect_bool(&arg.key, value)?;
            match key.as_str() {
                "debug" => cfg.derive_debug = flag,
                "default" => cfg.derive_default = flag,
                "copy" => cfg.derive_copy = flag,
                _ => {
                    return Err(syn::Error::new(
                        arg.key.span(),
                        "unknown key in attribute; expected 'debug' | 'default' | 'copy'",
                    ));
                }
            }
        }

        Ok(cfg)
    }
}
