//! Member-access, constructor and import completion

pub mod assembler;
pub mod chain;
pub mod constructors;
pub mod imports;
pub mod resolver;
pub mod template;

pub use assembler::{truncate_label, CompletionAssembler, CompletionItem, ItemKind};
pub use chain::AccessChain;
pub use constructors::constructor_target;
pub use imports::{import_query, qualified_name_from_path, qualified_names, ImportCandidate};
pub use resolver::{find_local_declaration, ChainResolver, ResolvedReference};
pub use template::{method_template, placeholder_template};
