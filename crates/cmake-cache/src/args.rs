//! CMake command-line arguments
//!
//! Classifies the tokens of a CMake invocation so that callers can find,
//! filter and rewrite them without string matching at every use site.

use std::fmt;

/// One token of a CMake command line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandLineArgument {
    /// Anything not recognized below; kept verbatim
    Unknown { source_argument: String },
    /// `-H<path>`: folder holding `CMakeLists.txt`
    CmakeListsPath { source_argument: String, path: String },
    /// `-B<path>`: binary output folder
    BinaryOutputPath { source_argument: String, path: String },
    /// `-G<name>`: build system generator
    GeneratorName {
        source_argument: String,
        generator: String,
    },
    /// `-D<name>=<value>`
    DefineProperty {
        source_argument: String,
        property_name: String,
        property_value: String,
    },
}

impl CommandLineArgument {
    /// Classify a single token
    pub fn parse(token: &str) -> Self {
        let source_argument = token.to_string();

        if let Some(definition) = token.strip_prefix("-D") {
            if let Some((name, value)) = definition.split_once('=') {
                if !name.is_empty() {
                    return CommandLineArgument::DefineProperty {
                        source_argument,
                        property_name: name.to_string(),
                        property_value: value.to_string(),
                    };
                }
            }
            return CommandLineArgument::Unknown { source_argument };
        }

        let flag = token.get(..2).unwrap_or_default();
        let remainder = token.get(2..).unwrap_or_default();
        if remainder.is_empty() {
            return CommandLineArgument::Unknown { source_argument };
        }

        match flag {
            "-H" => CommandLineArgument::CmakeListsPath {
                source_argument,
                path: remainder.to_string(),
            },
            "-B" => CommandLineArgument::BinaryOutputPath {
                source_argument,
                path: remainder.to_string(),
            },
            "-G" => CommandLineArgument::GeneratorName {
                source_argument,
                generator: remainder.to_string(),
            },
            _ => CommandLineArgument::Unknown { source_argument },
        }
    }

    /// The token this argument was parsed from
    pub fn source_argument(&self) -> &str {
        match self {
            CommandLineArgument::Unknown { source_argument }
            | CommandLineArgument::CmakeListsPath { source_argument, .. }
            | CommandLineArgument::BinaryOutputPath { source_argument, .. }
            | CommandLineArgument::GeneratorName { source_argument, .. }
            | CommandLineArgument::DefineProperty { source_argument, .. } => source_argument,
        }
    }

    /// Name of the defined property, for `-D` arguments
    pub fn property_name(&self) -> Option<&str> {
        match self {
            CommandLineArgument::DefineProperty { property_name, .. } => Some(property_name),
            _ => None,
        }
    }
}

impl fmt::Display for CommandLineArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandLineArgument::Unknown { source_argument } => f.write_str(source_argument),
            CommandLineArgument::CmakeListsPath { path, .. } => write!(f, "-H{}", path),
            CommandLineArgument::BinaryOutputPath { path, .. } => write!(f, "-B{}", path),
            CommandLineArgument::GeneratorName { generator, .. } => write!(f, "-G{}", generator),
            CommandLineArgument::DefineProperty {
                property_name,
                property_value,
                ..
            } => write!(f, "-D{}={}", property_name, property_value),
        }
    }
}

/// Classify every token, keeping order and length
pub fn parse_arguments<I, S>(tokens: I) -> Vec<CommandLineArgument>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| CommandLineArgument::parse(token.as_ref()))
        .collect()
}

/// Value of property `name`; the last definition wins, as in CMake
pub fn get_property_value<'a>(args: &'a [CommandLineArgument], name: &str) -> Option<&'a str> {
    args.iter().rev().find_map(|arg| match arg {
        CommandLineArgument::DefineProperty {
            property_name,
            property_value,
            ..
        } if property_name == name => Some(property_value.as_str()),
        _ => None,
    })
}

/// Drop every definition of property `name`
pub fn remove_property(args: &mut Vec<CommandLineArgument>, name: &str) {
    args.retain(|arg| arg.property_name() != Some(name));
}

/// Tokens the arguments were parsed from
pub fn to_string_arguments(args: &[CommandLineArgument]) -> Vec<String> {
    args.iter().map(|arg| arg.source_argument().to_string()).collect()
}
