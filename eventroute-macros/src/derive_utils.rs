use quote::ToTokens;
use syn::{Attribute, Token, punctuated::Punctuated};

// 拆分出已有的 derive 列表，其余属性原样保留
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("derive") {
            retained.push(attr.clone());
            continue;
        }
        if let Ok(list) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
        {
            existing.extend(list);
        }
    }

    (retained, existing)
}

// Serialize 与 serde::Serialize 视为同一个 derive
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let ident = last.ident.to_string();
            match ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{ident}"),
                _ => ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

/// 将 `required` 合并进 attrs 中的 derive（去重，required 在前），
/// 合并后的 derive 放在最前面，保证 `#[serde(..)]` 等辅助属性位于其后。
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);

    let mut seen = std::collections::HashSet::new();
    let merged: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}

/// 解析 `key = true|false` 形式的布尔参数列表
pub(crate) fn parse_bool_flags(
    input: syn::parse::ParseStream,
    allowed: &[&str],
) -> syn::Result<Vec<(String, bool)>> {
    let mut out: Vec<(String, bool)> = Vec::new();
    if input.is_empty() {
        return Ok(out);
    }

    let pairs: Punctuated<syn::MetaNameValue, Token![,]> = Punctuated::parse_terminated(input)?;
    for pair in pairs {
        let Some(key) = pair.path.get_ident().map(|i| i.to_string()) else {
            return Err(syn::Error::new_spanned(&pair.path, "expected identifier key"));
        };
        if !allowed.contains(&key.as_str()) {
            return Err(syn::Error::new_spanned(
                &pair.path,
                format!("unknown key '{key}'; expected one of: {}", allowed.join(", ")),
            ));
        }
        if out.iter().any(|(k, _)| *k == key) {
            return Err(syn::Error::new_spanned(
                &pair.path,
                format!("duplicate key '{key}' in attribute"),
            ));
        }
        let value = match &pair.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Bool(b),
                ..
            }) => b.value(),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    format!("expected boolean literal for '{key}'"),
                ));
            }
        };
        out.push((key, value));
    }

    Ok(out)
}

pub(crate) fn flag(flags: &[(String, bool)], key: &str, default: bool) -> bool {
    flags
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| *v)
        .unwrap_or(default)
}
