use catalog_common::EntityType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "catalog",
    about = "Catalog resolver CLI",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Store id every query is scoped to
    #[arg(long, global = true, default_value_t = 1)]
    pub store: i64,

    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize full-text search input
    Normalize(TextArgs),
    /// Escape search engine query syntax
    Escape(TextArgs),
    /// Translate a JSON filter into query clauses
    Translate(TranslateArgs),
    /// Resolve a products query against a JSON document file
    Products(ProductsArgs),
    /// Resolve a categories query against a JSON document file
    Categories(CategoriesArgs),
}

#[derive(Args)]
pub struct TextArgs {
    pub text: String,
}

#[derive(Args)]
pub struct TranslateArgs {
    /// Filter object, e.g. '{"price": {"gteq": 10}}'
    #[arg(long)]
    pub filter: String,

    /// Entity type the attribute codes belong to
    #[arg(long, default_value = "product")]
    pub entity: EntityType,
}

#[derive(Args)]
pub struct ProductsArgs {
    /// JSON file holding an array of documents
    #[arg(long)]
    pub docs: PathBuf,

    /// Full-text search
    #[arg(long, required_unless_present = "filter")]
    pub search: Option<String>,

    /// Filter object as JSON
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub page_size: Option<usize>,

    #[arg(long)]
    pub current_page: Option<usize>,

    /// Comma separated item fields to return
    #[arg(long, value_delimiter = ',', default_value = "sku,name")]
    pub fields: Vec<String>,

    /// Include facets and stats in the output
    #[arg(long)]
    pub aggregations: bool,

    /// Include debug info in the output
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args)]
pub struct CategoriesArgs {
    /// JSON file holding an array of documents
    #[arg(long)]
    pub docs: PathBuf,

    /// Comma separated category levels
    #[arg(long, value_delimiter = ',', required_unless_present = "ids")]
    pub levels: Vec<i64>,

    /// Comma separated category ids
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<i64>,

    /// Return the children of the given ids
    #[arg(long, requires = "ids")]
    pub children: bool,

    /// Comma separated item fields to return
    #[arg(long, value_delimiter = ',', default_value = "id,name")]
    pub fields: Vec<String>,

    /// Include debug info in the output
    #[arg(long)]
    pub debug: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_requires_search_or_filter() {
        assert!(Cli::try_parse_from(["catalog", "products", "--docs", "d.json"]).is_err());

        let cli = Cli::try_parse_from([
            "catalog",
            "products",
            "--docs",
            "d.json",
            "--search",
            "shirt",
            "--fields",
            "sku,price",
        ])
        .unwrap();
        match cli.command {
            Commands::Products(args) => {
                assert_eq!(args.search.as_deref(), Some("shirt"));
                assert_eq!(args.fields, vec!["sku", "price"]);
                assert_eq!(cli.store, 1);
            }
            _ => panic!("expected products"),
        }
    }

    #[test]
    fn test_categories_lists() {
        let cli = Cli::try_parse_from([
            "catalog",
            "--store",
            "3",
            "categories",
            "--docs",
            "d.json",
            "--ids",
            "10,20",
            "--children",
        ])
        .unwrap();
        assert_eq!(cli.store, 3);
        match cli.command {
            Commands::Categories(args) => {
                assert_eq!(args.ids, vec![10, 20]);
                assert!(args.levels.is_empty());
                assert!(args.children);
            }
            _ => panic!("expected categories"),
        }

        assert!(
            Cli::try_parse_from(["catalog", "categories", "--docs", "d.json", "--children"])
                .is_err()
        );
    }

    #[test]
    fn test_translate_entity() {
        let cli = Cli::try_parse_from([
            "catalog",
            "translate",
            "--filter",
            "{}",
            "--entity",
            "cms_page",
        ])
        .unwrap();
        match cli.command {
            Commands::Translate(args) => assert_eq!(args.entity, EntityType::CmsPage),
            _ => panic!("expected translate"),
        }
        assert!(Cli::try_parse_from(["catalog", "translate", "--filter", "{}", "--entity", "x"])
            .is_err());
    }
}
