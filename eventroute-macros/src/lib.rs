//! eventroute 过程宏
//!
//! - `#[value_object]`：为值对象追加统一派生（Clone/Serialize/Deserialize/PartialEq/Eq，可选 Debug/Default）
//! - `#[entity_id]`：为单字段 tuple struct 形式的标识类型生成派生与常用转换
//!
use proc_macro::TokenStream;

mod derive_utils;
mod entity_id;
mod value_object;

/// 值对象宏
///
/// ```ignore
/// #[value_object(default = true)]
/// pub struct Channel(String);
/// ```
#[proc_macro_attribute]
pub fn value_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    value_object::expand(attr, item)
}

/// 实体 ID 宏
///
/// ```ignore
/// #[entity_id]
/// pub struct RouteId(String);
/// ```
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}
