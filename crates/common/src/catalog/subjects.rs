//! Subject classification from title keywords
//!
//! Labels are tested in `Subject::PRIORITY` order and the first label with a
//! matching pattern wins. Several labels share keywords ("C++" is listed under
//! both Programming Fundamentals and OOPs), so the order decides the result.

use regex_lite::{Regex, RegexBuilder};
use std::sync::OnceLock;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    ComputerNetworks,
    OperatingSystems,
    Dbms,
    DataStructures,
    ProgrammingFundamentals,
    Oops,
    TheoryOfComputation,
    CompilerDesign,
    ComputerArchitecture,
    DigitalElectronics,
    SoftwareEngineering,
    DiscreteMathematics,
    MachineLearning,
    WebDevelopment,
}

impl Subject {
    /// Match priority, first to last
    pub const PRIORITY: [Subject; 14] = [
        Subject::ComputerNetworks,
        Subject::OperatingSystems,
        Subject::Dbms,
        Subject::DataStructures,
        Subject::ProgrammingFundamentals,
        Subject::Oops,
        Subject::TheoryOfComputation,
        Subject::CompilerDesign,
        Subject::ComputerArchitecture,
        Subject::DigitalElectronics,
        Subject::SoftwareEngineering,
        Subject::DiscreteMathematics,
        Subject::MachineLearning,
        Subject::WebDevelopment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Subject::ComputerNetworks => "Computer Networks",
            Subject::OperatingSystems => "Operating Systems",
            Subject::Dbms => "DBMS",
            Subject::DataStructures => "Data Structures & Algorithms",
            Subject::ProgrammingFundamentals => "Programming Fundamentals",
            Subject::Oops => "OOPs",
            Subject::TheoryOfComputation => "Theory of Computation",
            Subject::CompilerDesign => "Compiler Design",
            Subject::ComputerArchitecture => "Computer Organization & Architecture",
            Subject::DigitalElectronics => "Digital Electronics",
            Subject::SoftwareEngineering => "Software Engineering",
            Subject::DiscreteMathematics => "Discrete Mathematics",
            Subject::MachineLearning => "Machine Learning & AI",
            Subject::WebDevelopment => "Web Development",
        }
    }

    /// Case-insensitive patterns matched against the title
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            Subject::ComputerNetworks => &[
                r"computer network",
                r"\bnetworking\b",
                r"\bcn\b",
                r"tcp/ip",
                r"data communication",
                r"top-down approach",
            ],
            Subject::OperatingSystems => &[
                r"operating system",
                r"\bos\b",
                r"\bunix\b",
                r"\blinux\b",
            ],
            Subject::Dbms => &[
                r"database",
                r"\bdbms\b",
                r"\bsql\b",
                r"\bnosql\b",
            ],
            Subject::DataStructures => &[
                r"data structure",
                r"algorithm",
                r"\bdsa\b",
            ],
            Subject::ProgrammingFundamentals => &[
                r"programming in c\b",
                r"\bc programming",
                r"let us c\b",
                r"c\+\+",
                r"\bpython\b",
                r"programming fundamentals",
            ],
            Subject::Oops => &[
                r"object[- ]oriented",
                r"\boops?\b",
                r"c\+\+",
                r"\bjava\b",
            ],
            Subject::TheoryOfComputation => &[
                r"theory of computation",
                r"automata",
                r"formal languages",
                r"\btoc\b",
            ],
            Subject::CompilerDesign => &[
                r"compiler",
                r"\bdragon book\b",
            ],
            Subject::ComputerArchitecture => &[
                r"computer organi[sz]ation",
                r"computer architecture",
                r"\bcoa\b",
                r"microprocessor",
            ],
            Subject::DigitalElectronics => &[
                r"digital (logic|design|electronics)",
                r"switching theory",
            ],
            Subject::SoftwareEngineering => &[
                r"software engineering",
                r"software testing",
                r"\bsdlc\b",
            ],
            Subject::DiscreteMathematics => &[
                r"discrete math",
                r"graph theory",
                r"combinatorics",
            ],
            Subject::MachineLearning => &[
                r"machine learning",
                r"deep learning",
                r"artificial intelligence",
                r"neural network",
                r"\bai\b",
            ],
            Subject::WebDevelopment => &[
                r"web development",
                r"\bhtml\b",
                r"\bcss\b",
                r"javascript",
                r"\breact\b",
                r"\bnode\.?js\b",
            ],
        }
    }
}

struct CompiledSubject {
    subject: Subject,
    patterns: Vec<Regex>,
}

fn compiled_table() -> &'static [CompiledSubject] {
    static TABLE: OnceLock<Vec<CompiledSubject>> = OnceLock::new();
    TABLE.get_or_init(|| {
        Subject::PRIORITY
            .iter()
            .map(|&subject| CompiledSubject {
                subject,
                patterns: subject
                    .patterns()
                    .iter()
                    .filter_map(|pattern| {
                        RegexBuilder::new(pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| warn!(pattern, error = %e, "Skipping invalid subject pattern"))
                            .ok()
                    })
                    .collect(),
            })
            .collect()
    })
}

/// First subject whose patterns match `title`
pub fn classify(title: &str) -> Option<Subject> {
    compiled_table()
        .iter()
        .find(|entry| entry.patterns.iter().any(|re| re.is_match(title)))
        .map(|entry| entry.subject)
}

/// Label of the first matching subject
pub fn classify_label(title: &str) -> Option<&'static str> {
    classify(title).map(|subject| subject.label())
}
