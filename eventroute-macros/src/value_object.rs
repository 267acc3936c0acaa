use crate::derive_utils::{apply_derives, flag, parse_bool_flags};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

/// #[value_object] 宏实现
/// - 支持结构体（具名或 tuple）与枚举
/// - 合并/追加派生：Clone, Serialize, Deserialize, PartialEq, Eq
/// - 参数：`debug = true|false`（默认 true）、`default = true|false`（默认 false）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ValueObjectArgs);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
    ];
    if cfg.debug {
        required.insert(0, syn::parse_quote!(Debug));
    }
    if cfg.default {
        required.push(syn::parse_quote!(Default));
    }

    match &mut input {
        Item::Struct(st) => apply_derives(&mut st.attrs, required),
        Item::Enum(en) => apply_derives(&mut en.attrs, required),
        other => {
            return syn::Error::new(other.span(), "#[value_object] only supports struct or enum")
                .to_compile_error()
                .into();
        }
    }

    TokenStream::from(quote! { #input })
}

struct ValueObjectArgs {
    debug: bool,
    default: bool,
}

impl Parse for ValueObjectArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let flags = parse_bool_flags(input, &["debug", "default"])?;
        Ok(Self {
            debug: flag(&flags, "debug", true),
            default: flag(&flags, "default", false),
        })
    }
}
