//! domquery Derive Macros: generated query families
//!
//! Every lookup strategy needs the same six retrieval operations:
//! `query_all`, `query`, `get_all`, `get`, `find` and `find_all`. Writing
//! 6 x 8 functions by hand invites drift (a forgotten `find_all_by_title`,
//! a `get_by_alt_text` that forgets the multiple-match check), so both
//! sides of the boundary are generated from one enum each.
//!
//! # Available Macros
//!
//! - [`BuildQueries`] - Provider side: emits the named query functions and
//!   the matching `Screen` methods from a query-kind enum
//! - [`QueryBindings`] - Selector side: emits the dispatch bindings that
//!   map an (operation, strategy) pair onto those functions
//!
//! # Example
//!
//! ```ignore
//! #[derive(BuildQueries)]
//! pub enum QueryKind {
//!     #[query(options = ByRoleOptions, collect = crate::role::collect_by_role)]
//!     Role,
//! }
//!
//! // Generates query_all_by_role, query_by_role, get_all_by_role,
//! // get_by_role, find_by_role, find_all_by_role and Screen::{same six}.
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Path, Type};

/// Result shape of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    One,
    Many,
    Maybe,
}

impl Shape {
    fn found_variant(self) -> Ident {
        match self {
            Self::One => format_ident!("One"),
            Self::Many => format_ident!("Many"),
            Self::Maybe => format_ident!("Maybe"),
        }
    }
}

/// One of the six retrieval operations
#[derive(Debug, Clone, Copy)]
struct OperationDef {
    /// Variant name of the selector-side `Operation` enum
    variant: &'static str,
    /// Function name prefix (`get` in `get_by_role`)
    prefix: &'static str,
    is_async: bool,
    shape: Shape,
}

const OPERATIONS: [OperationDef; 6] = [
    OperationDef {
        variant: "Get",
        prefix: "get",
        is_async: false,
        shape: Shape::One,
    },
    OperationDef {
        variant: "GetAll",
        prefix: "get_all",
        is_async: false,
        shape: Shape::Many,
    },
    OperationDef {
        variant: "Find",
        prefix: "find",
        is_async: true,
        shape: Shape::One,
    },
    OperationDef {
        variant: "FindAll",
        prefix: "find_all",
        is_async: true,
        shape: Shape::Many,
    },
    OperationDef {
        variant: "Query",
        prefix: "query",
        is_async: false,
        shape: Shape::Maybe,
    },
    OperationDef {
        variant: "QueryAll",
        prefix: "query_all",
        is_async: false,
        shape: Shape::Many,
    },
];

/// A unit variant plus its parsed attribute
struct StrategyVariant {
    ident: Ident,
    snake: String,
    options: Type,
    collect: Option<Path>,
}

impl StrategyVariant {
    fn function(&self, prefix: &str) -> Ident {
        format_ident!("{}_by_{}", prefix, self.snake)
    }
}

/// Derive macro for the provider's query families.
///
/// Each unit variant must carry `#[query(options = Type, collect = path)]`,
/// where `path` is a `fn(&Element, &Matcher, &Type) -> QueryResult<Vec<Element>>`.
/// For a variant `LabelText` it generates:
///
/// - `query_all_by_label_text` - the collect function, traced
/// - `query_by_label_text` - zero or one match
/// - `get_all_by_label_text` - at least one match
/// - `get_by_label_text` - exactly one match
/// - `find_by_label_text` / `find_all_by_label_text` - async, via `wait_for`
/// - the same six as methods on `Screen`
///
/// The enum additionally gets `ALL` and `name()`.
#[proc_macro_derive(BuildQueries, attributes(query))]
pub fn derive_build_queries(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_build_queries(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive macro for the selector dispatch bindings.
///
/// Each unit variant must carry `#[bind(options = Type)]`. For every
/// variant and each of the six operations it emits a private function
/// `bound_{op}_by_{variant}` that calls `::domquery::{op}_by_{variant}`
/// and wraps the result in `crate::dispatch::Found`. The enum gets:
///
/// - `ALL` - every strategy in declaration order
/// - `name()` - the variant name (`LabelText`)
/// - `suffix()` - the identifier suffix (`ByLabelText`)
/// - `bindings()` - all (`QueryId`, `Binding`) pairs
#[proc_macro_derive(QueryBindings, attributes(bind))]
pub fn derive_query_bindings(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_query_bindings(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ============================================================================
// Expansion
// ============================================================================

fn expand_build_queries(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let kind = &input.ident;
    let variants = parse_variants(input, "query", true)?;
    let common = enum_constants(&variants);

    let mut functions = Vec::new();
    let mut methods = Vec::new();
    for variant in &variants {
        let ident = &variant.ident;
        let options = &variant.options;
        let name = ident.to_string();
        let collect = variant
            .collect
            .as_ref()
            .ok_or_else(|| syn::Error::new(ident.span(), "missing `collect = path`"))?;

        let query_all = variant.function("query_all");
        let query = variant.function("query");
        let get_all = variant.function("get_all");
        let get = variant.function("get");
        let find = variant.function("find");
        let find_all = variant.function("find_all");

        let doc = |what: &str| format!("{what} by {name}");
        let doc_query_all = doc("All matches (possibly none)");
        let doc_query = doc("Zero or one match; errors on several");
        let doc_get_all = doc("All matches; errors on none");
        let doc_get = doc("Exactly one match");
        let doc_find = doc("Wait for exactly one match");
        let doc_find_all = doc("Wait for at least one match");

        functions.push(quote! {
            #[doc = #doc_query_all]
            pub fn #query_all(
                container: &crate::dom::Element,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<::std::vec::Vec<crate::dom::Element>> {
                ::tracing::trace!(kind = #name, %matcher, "query_all");
                #collect(container, matcher, options)
            }

            #[doc = #doc_query]
            pub fn #query(
                container: &crate::dom::Element,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<::std::option::Option<crate::dom::Element>> {
                let found = #query_all(container, matcher, options)?;
                crate::queries::expect_at_most_one(#kind::#ident, container, matcher, options, found)
            }

            #[doc = #doc_get_all]
            pub fn #get_all(
                container: &crate::dom::Element,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<::std::vec::Vec<crate::dom::Element>> {
                let found = #query_all(container, matcher, options)?;
                crate::queries::expect_some(#kind::#ident, container, matcher, options, found)
            }

            #[doc = #doc_get]
            pub fn #get(
                container: &crate::dom::Element,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<crate::dom::Element> {
                let found = #query_all(container, matcher, options)?;
                crate::queries::expect_one(#kind::#ident, container, matcher, options, found)
            }

            #[doc = #doc_find]
            pub async fn #find(
                container: &crate::dom::Element,
                matcher: &crate::matcher::Matcher,
                options: &#options,
                wait: ::std::option::Option<&crate::wait::WaitForOptions>,
            ) -> crate::result::QueryResult<crate::dom::Element> {
                crate::wait::wait_for(container.document(), wait, || {
                    #get(container, matcher, options)
                })
                .await
            }

            #[doc = #doc_find_all]
            pub async fn #find_all(
                container: &crate::dom::Element,
                matcher: &crate::matcher::Matcher,
                options: &#options,
                wait: ::std::option::Option<&crate::wait::WaitForOptions>,
            ) -> crate::result::QueryResult<::std::vec::Vec<crate::dom::Element>> {
                crate::wait::wait_for(container.document(), wait, || {
                    #get_all(container, matcher, options)
                })
                .await
            }
        });

        methods.push(quote! {
            #[doc = #doc_query_all]
            pub fn #query_all(
                &self,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<::std::vec::Vec<crate::dom::Element>> {
                #query_all(&self.container(), matcher, options)
            }

            #[doc = #doc_query]
            pub fn #query(
                &self,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<::std::option::Option<crate::dom::Element>> {
                #query(&self.container(), matcher, options)
            }

            #[doc = #doc_get_all]
            pub fn #get_all(
                &self,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<::std::vec::Vec<crate::dom::Element>> {
                #get_all(&self.container(), matcher, options)
            }

            #[doc = #doc_get]
            pub fn #get(
                &self,
                matcher: &crate::matcher::Matcher,
                options: &#options,
            ) -> crate::result::QueryResult<crate::dom::Element> {
                #get(&self.container(), matcher, options)
            }

            #[doc = #doc_find]
            pub async fn #find(
                &self,
                matcher: &crate::matcher::Matcher,
                options: &#options,
                wait: ::std::option::Option<&crate::wait::WaitForOptions>,
            ) -> crate::result::QueryResult<crate::dom::Element> {
                let container = self.container();
                #find(&container, matcher, options, wait).await
            }

            #[doc = #doc_find_all]
            pub async fn #find_all(
                &self,
                matcher: &crate::matcher::Matcher,
                options: &#options,
                wait: ::std::option::Option<&crate::wait::WaitForOptions>,
            ) -> crate::result::QueryResult<::std::vec::Vec<crate::dom::Element>> {
                let container = self.container();
                #find_all(&container, matcher, options, wait).await
            }
        });
    }

    Ok(quote! {
        impl #kind {
            #common
        }

        #(#functions)*

        impl crate::screen::Screen {
            #(#methods)*
        }
    })
}

fn expand_query_bindings(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let strategy = &input.ident;
    let variants = parse_variants(input, "bind", false)?;
    let common = enum_constants(&variants);

    let idents: Vec<&Ident> = variants.iter().map(|v| &v.ident).collect();
    let suffixes: Vec<String> = variants.iter().map(|v| format!("By{}", v.ident)).collect();

    let mut shims = Vec::new();
    let mut entries = Vec::new();
    for variant in &variants {
        let ident = &variant.ident;
        let options = &variant.options;
        for operation in OPERATIONS {
            let target = variant.function(operation.prefix);
            let shim = format_ident!("bound_{}", target);
            let found = operation.shape.found_variant();
            let op_variant = format_ident!("{}", operation.variant);

            if operation.is_async {
                shims.push(quote! {
                    #[doc(hidden)]
                    fn #shim<'a>(
                        container: &'a ::domquery::Element,
                        matcher: &'a ::domquery::Matcher,
                        options: &'a #options,
                        wait: ::std::option::Option<&'a ::domquery::WaitForOptions>,
                    ) -> ::futures::future::BoxFuture<'a, ::domquery::QueryResult<crate::dispatch::Found>> {
                        ::std::boxed::Box::pin(async move {
                            ::domquery::#target(container, matcher, options, wait)
                                .await
                                .map(crate::dispatch::Found::#found)
                        })
                    }
                });
                entries.push(quote! {
                    (
                        crate::dispatch::QueryId::new(crate::dispatch::Operation::#op_variant, #strategy::#ident),
                        <#options as crate::dispatch::IntoBinding>::into_binding(
                            crate::dispatch::Lookup::Async(#shim),
                        ),
                    )
                });
            } else {
                shims.push(quote! {
                    #[doc(hidden)]
                    fn #shim(
                        container: &::domquery::Element,
                        matcher: &::domquery::Matcher,
                        options: &#options,
                    ) -> ::domquery::QueryResult<crate::dispatch::Found> {
                        ::domquery::#target(container, matcher, options)
                            .map(crate::dispatch::Found::#found)
                    }
                });
                entries.push(quote! {
                    (
                        crate::dispatch::QueryId::new(crate::dispatch::Operation::#op_variant, #strategy::#ident),
                        <#options as crate::dispatch::IntoBinding>::into_binding(
                            crate::dispatch::Lookup::Sync(#shim),
                        ),
                    )
                });
            }
        }
    }

    Ok(quote! {
        impl #strategy {
            #common

            /// Identifier suffix (`"By"` + variant name)
            #[must_use]
            pub const fn suffix(self) -> &'static str {
                match self {
                    #(Self::#idents => #suffixes),*
                }
            }

            /// Every (query id, binding) pair, one per operation and strategy
            pub(crate) fn bindings() -> ::std::vec::Vec<(crate::dispatch::QueryId, crate::dispatch::Binding)> {
                ::std::vec![#(#entries),*]
            }
        }

        #(#shims)*
    })
}

/// `ALL` and `name()`, shared by both derives
fn enum_constants(variants: &[StrategyVariant]) -> TokenStream2 {
    let idents: Vec<&Ident> = variants.iter().map(|v| &v.ident).collect();
    let names: Vec<String> = variants.iter().map(|v| v.ident.to_string()).collect();
    let count = variants.len();
    quote! {
        /// Every variant, in declaration order
        pub const ALL: [Self; #count] = [#(Self::#idents),*];

        /// Variant name
        #[must_use]
        pub const fn name(self) -> &'static str {
            match self {
                #(Self::#idents => #names),*
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse unit variants and their `#[attr(options = T, collect = path)]`
fn parse_variants(
    input: &DeriveInput,
    attr: &str,
    allow_collect: bool,
) -> syn::Result<Vec<StrategyVariant>> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "only enums with unit variants are supported",
        ));
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.ident.span(),
                "query strategies must be unit variants",
            ));
        }

        let mut options: Option<Type> = None;
        let mut collect: Option<Path> = None;
        for attribute in variant.attrs.iter().filter(|a| a.path().is_ident(attr)) {
            attribute.parse_nested_meta(|meta| {
                if meta.path.is_ident("options") {
                    options = Some(meta.value()?.parse()?);
                    Ok(())
                } else if allow_collect && meta.path.is_ident("collect") {
                    collect = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error(format!("unsupported `{attr}` key")))
                }
            })?;
        }

        let options = options.ok_or_else(|| {
            syn::Error::new(
                variant.ident.span(),
                format!("missing #[{attr}(options = Type)]"),
            )
        })?;
        variants.push(StrategyVariant {
            snake: to_snake_case(&variant.ident.to_string()),
            ident: variant.ident.clone(),
            options,
            collect,
        });
    }

    if variants.is_empty() {
        return Err(syn::Error::new(
            input.ident.span(),
            "at least one strategy variant is required",
        ));
    }
    Ok(variants)
}

/// Convert PascalCase to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = true;
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("Role"), "role");
        assert_eq!(to_snake_case("LabelText"), "label_text");
        assert_eq!(to_snake_case("PlaceholderText"), "placeholder_text");
        assert_eq!(to_snake_case("TestId"), "test_id");
        // Consecutive uppercase letters are treated as a unit
        assert_eq!(to_snake_case("ID"), "id");
    }

    #[test]
    fn test_operations_cover_six_prefixes() {
        let prefixes: Vec<&str> = OPERATIONS.iter().map(|op| op.prefix).collect();
        assert_eq!(
            prefixes,
            vec!["get", "get_all", "find", "find_all", "query", "query_all"]
        );
        assert_eq!(OPERATIONS.iter().filter(|op| op.is_async).count(), 2);
    }

    #[test]
    fn test_build_queries_emits_all_six_functions() {
        let input: DeriveInput = parse_quote! {
            enum QueryKind {
                #[query(options = MatcherOptions, collect = crate::attributes::collect_by_title)]
                Title,
            }
        };
        let output = expand_build_queries(&input).unwrap().to_string();
        for name in [
            "fn query_all_by_title",
            "fn query_by_title",
            "fn get_all_by_title",
            "fn get_by_title",
            "async fn find_by_title",
            "async fn find_all_by_title",
        ] {
            assert!(output.contains(name), "missing {name}");
        }
        assert!(output.contains("impl crate :: screen :: Screen"));
    }

    #[test]
    fn test_build_queries_requires_collect() {
        let input: DeriveInput = parse_quote! {
            enum QueryKind {
                #[query(options = MatcherOptions)]
                Title,
            }
        };
        assert!(expand_build_queries(&input).is_err());
    }

    #[test]
    fn test_query_bindings_emit_one_entry_per_operation() {
        let input: DeriveInput = parse_quote! {
            enum Strategy {
                #[bind(options = ByRoleOptions)]
                Role,
                #[bind(options = MatcherOptions)]
                TestId,
            }
        };
        let output = expand_query_bindings(&input).unwrap().to_string();
        assert_eq!(output.matches("crate :: dispatch :: QueryId :: new").count(), 12);
        assert!(output.contains("fn bound_find_all_by_test_id"));
        assert!(output.contains("\"ByTestId\""));
    }

    #[test]
    fn test_rejects_non_unit_variants_and_unknown_keys() {
        let tuple: DeriveInput = parse_quote! {
            enum Strategy {
                #[bind(options = MatcherOptions)]
                Role(u8),
            }
        };
        assert!(expand_query_bindings(&tuple).is_err());

        let unknown: DeriveInput = parse_quote! {
            enum Strategy {
                #[bind(options = MatcherOptions, collect = foo)]
                Role,
            }
        };
        assert!(expand_query_bindings(&unknown).is_err());
    }
}
