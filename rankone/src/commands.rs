use crate::CLAP_STYLING;
use clap::{arg, command};
use rankone::handlers::DEFAULT_DB_DIR;
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("rankone")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("rankone")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Log debug output to stderr").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the rankone report database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the rankone database in")
                        .default_value(DEFAULT_DB_DIR),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Removes any existing database at the specified location first.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Analyzes a single page and prints its score. With --node the report is \
                stored for that content node, which makes it eligible for `update`.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to analyze")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-n --"node" <ID>)
                        .required(false)
                        .help("Content node id to store the report under")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    arg!(-k --"keyword" <KEYWORD>)
                        .required(false)
                        .requires("node")
                        .help("Focus keyword stored with the report"),
                )
                .arg(db_arg())
                .arg(timeout_arg())
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("scores")
                .about("Shows the stored scores of a content tree without re-analyzing anything")
                .arg(tree_arg())
                .arg(db_arg())
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("update")
                .about(
                    "Re-analyzes every node of a content tree that already has a stored report \
                and stores the fresh scores.",
                )
                .arg(tree_arg())
                .arg(db_arg())
                .arg(timeout_arg())
                .arg(
                    arg!(-c --"concurrency" <NUM>)
                        .required(false)
                        .help("How many sibling pages to analyze at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(format_arg())
                .arg(output_arg()),
        )
}

fn tree_arg() -> clap::Arg {
    arg!(-t --"tree" <PATH>)
        .required(true)
        .help("JSON file describing the content tree (id, name, url, template_id, children)")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

fn db_arg() -> clap::Arg {
    arg!(-d --"db" <PATH>)
        .required(false)
        .help("Directory holding the rankone database")
        .default_value(DEFAULT_DB_DIR)
}

fn timeout_arg() -> clap::Arg {
    arg!(--"timeout" <SECONDS>)
        .required(false)
        .help("Request timeout in seconds, also bounds the compression probe")
        .value_parser(clap::value_parser!(u64))
        .default_value("10")
}

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json")
        .value_parser(["text", "json"])
        .default_value("text")
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition_is_valid() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_update_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["rankone", "update", "--tree", "tree.json"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();

        assert_eq!(name, "update");
        assert_eq!(sub.get_one::<usize>("concurrency"), Some(&4));
        assert_eq!(sub.get_one::<u64>("timeout"), Some(&10));
        assert_eq!(
            sub.get_one::<String>("db").map(String::as_str),
            Some(DEFAULT_DB_DIR)
        );
    }

    #[test]
    fn test_analyze_node_is_optional() {
        let matches = command_argument_builder()
            .try_get_matches_from(["rankone", "analyze", "-u", "https://example.com/", "-n", "7"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        assert_eq!(sub.get_one::<i64>("node"), Some(&7));
        assert!(sub.get_one::<String>("keyword").is_none());
    }

    #[test]
    fn test_analyze_keyword_requires_node() {
        let result = command_argument_builder().try_get_matches_from([
            "rankone",
            "analyze",
            "-u",
            "https://example.com/",
            "-k",
            "shoes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_analyze_requires_valid_url() {
        let result =
            command_argument_builder().try_get_matches_from(["rankone", "analyze", "-u", "nope"]);
        assert!(result.is_err());
    }
}
