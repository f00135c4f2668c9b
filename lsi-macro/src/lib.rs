//! Proc-macro host for lsi.
//!
//! A procedural macro sees the tokens of the item it is attached to. This
//! crate parses them with `syn` and exposes the structs and enums through the
//! common views in [`lsi_core`]:
//!
//! ```ignore
//! #[proc_macro_attribute]
//! pub fn entities(args: TokenStream, input: TokenStream) -> TokenStream {
//!     let module = syn::parse_macro_input!(input as syn::ItemMod);
//!     let logger = Rc::new(MacroLogger::new(Span::call_site()));
//!     let env = lsi_macro::environment(args.into(), logger.clone());
//!     let host = match MacroHost::from_module(&module) {
//!         Ok(host) => host,
//!         Err(err) => return syn::Error::new_spanned(&module, err).to_compile_error().into(),
//!     };
//!     let mut sink = MemorySink::new();
//!     let _ = lsi_core::run(&host, &env, &MyGenerator, &mut sink);
//!     logger.to_compile_errors().into()
//! }
//! ```

mod class;
mod host;
mod logger;
pub mod syntax;

use std::rc::Rc;

pub use class::{MacroClass, MacroField, MacroMethod};
pub use host::MacroHost;
pub use logger::MacroLogger;

use lsi_core::{Environment, Logger, parse_arguments};
use proc_macro2::TokenStream;

/// Options written as `key = value` arguments of the invoking attribute.
/// Positional arguments are not options and are skipped.
pub fn options_from_args(args: &TokenStream) -> Vec<(String, String)> {
    parse_arguments(&args.to_string())
        .into_iter()
        .filter_map(|arg| arg.name.map(|name| (name, arg.value)))
        .collect()
}

/// Environment for one expansion, configured from the attribute arguments.
pub fn environment(args: TokenStream, logger: Rc<dyn Logger>) -> Environment {
    Environment::builder()
        .options(options_from_args(&args))
        .logger(logger)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn test_options_from_args() {
        let args = quote!(dialect = "postgres", prefix = sys_, verbose);
        let options = options_from_args(&args);
        assert_eq!(
            options,
            vec![
                ("dialect".to_string(), "postgres".to_string()),
                ("prefix".to_string(), "sys_".to_string()),
            ]
        );
    }

    #[test]
    fn test_environment_uses_macro_logger() {
        let logger = Rc::new(MacroLogger::new(proc_macro2::Span::call_site()));
        let env = environment(quote!(dialect = "mysql"), logger.clone());
        assert_eq!(env.option("dialect", "postgres"), "mysql");
        assert_eq!(env.option("prefix", ""), "");
        env.logger().error("bad column");
        assert!(logger.has_errors());
    }
}
