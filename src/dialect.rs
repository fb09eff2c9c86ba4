//! Dialect configuration shared by the lexer and the parser.
//!
//! A [`DialectConfig`] is built once per parse and handed by reference to
//! [`crate::syntax::Parser::new`], which constructs its lexer from the same
//! reference. Keyword recognition, device prefixes and a handful of lexical
//! switches all hang off this one value.

use std::fmt;
use std::str::FromStr;

use crate::error::NetlistError;
use crate::syntax::keywords::{Keyword, KeywordFamily};
use crate::syntax::SyntaxKind;

/// Grammar family a statement is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// SPICE-like dot-command netlists
    Spice,
    /// Spectre native syntax
    Spectre,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Spice => f.write_str("spice"),
            Language::Spectre => f.write_str("spectre"),
        }
    }
}

/// Named netlist dialects with a preset configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Dialect {
    /// Permissive SPICE superset
    Generic,
    /// ngspice
    Ngspice,
    /// HSPICE
    Hspice,
    /// LTspice
    Ltspice,
    /// PSpice
    Pspice,
    /// Xyce
    Xyce,
    /// Spectre native netlists
    Spectre,
}

impl Dialect {
    /// All dialects with a preset.
    pub const ALL: &'static [Dialect] = &[
        Dialect::Generic,
        Dialect::Ngspice,
        Dialect::Hspice,
        Dialect::Ltspice,
        Dialect::Pspice,
        Dialect::Xyce,
        Dialect::Spectre,
    ];

    /// Lower-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Ngspice => "ngspice",
            Dialect::Hspice => "hspice",
            Dialect::Ltspice => "ltspice",
            Dialect::Pspice => "pspice",
            Dialect::Xyce => "xyce",
            Dialect::Spectre => "spectre",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = NetlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NetlistError::UnknownDialect { name: s.to_string() })
    }
}

/// Circuit element selected by an instance-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// R
    Resistor,
    /// C
    Capacitor,
    /// L
    Inductor,
    /// K, coupling between inductors
    MutualInductor,
    /// D
    Diode,
    /// Q
    Bjt,
    /// M
    Mosfet,
    /// J
    Jfet,
    /// Z (B in PSpice)
    Mesfet,
    /// V
    VoltageSource,
    /// I
    CurrentSource,
    /// E, voltage-controlled voltage source
    Vcvs,
    /// F, current-controlled current source
    Cccs,
    /// G, voltage-controlled current source
    Vccs,
    /// H, current-controlled voltage source
    Ccvs,
    /// B, arbitrary behavioral source
    BehavioralSource,
    /// S, voltage-controlled switch
    Switch,
    /// W, current-controlled switch
    CurrentSwitch,
    /// S in HSPICE, S-parameter element
    SParameter,
    /// T (and W in HSPICE)
    TransmissionLine,
    /// X
    SubcktCall,
    /// Any other element letter the dialect reserves
    Generic,
}

impl DeviceKind {
    /// The production the parser builds for this device.
    pub fn syntax_kind(self) -> SyntaxKind {
        match self {
            DeviceKind::Resistor => SyntaxKind::Resistor,
            DeviceKind::Capacitor => SyntaxKind::Capacitor,
            DeviceKind::Inductor => SyntaxKind::Inductor,
            DeviceKind::MutualInductor => SyntaxKind::MutualInductor,
            DeviceKind::Diode => SyntaxKind::Diode,
            DeviceKind::Bjt => SyntaxKind::Bjt,
            DeviceKind::Mosfet => SyntaxKind::Mosfet,
            DeviceKind::Jfet => SyntaxKind::Jfet,
            DeviceKind::Mesfet => SyntaxKind::Mesfet,
            DeviceKind::VoltageSource => SyntaxKind::VoltageSource,
            DeviceKind::CurrentSource => SyntaxKind::CurrentSource,
            DeviceKind::Vcvs => SyntaxKind::Vcvs,
            DeviceKind::Cccs => SyntaxKind::Cccs,
            DeviceKind::Vccs => SyntaxKind::Vccs,
            DeviceKind::Ccvs => SyntaxKind::Ccvs,
            DeviceKind::BehavioralSource => SyntaxKind::BehavioralSource,
            DeviceKind::Switch => SyntaxKind::Switch,
            DeviceKind::CurrentSwitch => SyntaxKind::CurrentSwitch,
            DeviceKind::SParameter => SyntaxKind::SParameter,
            DeviceKind::TransmissionLine => SyntaxKind::TransmissionLine,
            DeviceKind::SubcktCall => SyntaxKind::SubcktCall,
            DeviceKind::Generic => SyntaxKind::GenericDevice,
        }
    }
}

/// Mapping from an instance's first letter to its device kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixTable {
    entries: [Option<DeviceKind>; 26],
}

impl PrefixTable {
    /// A table with no prefixes.
    pub const fn empty() -> Self {
        Self { entries: [None; 26] }
    }

    /// The SPICE3 letter assignment shared by most dialects.
    pub fn spice3() -> Self {
        Self::empty()
            .with('R', DeviceKind::Resistor)
            .with('C', DeviceKind::Capacitor)
            .with('L', DeviceKind::Inductor)
            .with('K', DeviceKind::MutualInductor)
            .with('D', DeviceKind::Diode)
            .with('Q', DeviceKind::Bjt)
            .with('M', DeviceKind::Mosfet)
            .with('J', DeviceKind::Jfet)
            .with('Z', DeviceKind::Mesfet)
            .with('V', DeviceKind::VoltageSource)
            .with('I', DeviceKind::CurrentSource)
            .with('E', DeviceKind::Vcvs)
            .with('F', DeviceKind::Cccs)
            .with('G', DeviceKind::Vccs)
            .with('H', DeviceKind::Ccvs)
            .with('B', DeviceKind::BehavioralSource)
            .with('S', DeviceKind::Switch)
            .with('W', DeviceKind::CurrentSwitch)
            .with('T', DeviceKind::TransmissionLine)
            .with('X', DeviceKind::SubcktCall)
            .with('A', DeviceKind::Generic)
            .with('N', DeviceKind::Generic)
            .with('O', DeviceKind::Generic)
            .with('P', DeviceKind::Generic)
            .with('U', DeviceKind::Generic)
            .with('Y', DeviceKind::Generic)
    }

    /// Assign `letter` (case-insensitive) to `kind`.
    pub fn with(mut self, letter: char, kind: DeviceKind) -> Self {
        if let Some(slot) = Self::slot(letter) {
            self.entries[slot] = Some(kind);
        }
        self
    }

    /// Remove the assignment for `letter`.
    pub fn without(mut self, letter: char) -> Self {
        if let Some(slot) = Self::slot(letter) {
            self.entries[slot] = None;
        }
        self
    }

    /// Device kind for an instance starting with `letter`.
    pub fn lookup(&self, letter: char) -> Option<DeviceKind> {
        Self::slot(letter).and_then(|slot| self.entries[slot])
    }

    fn slot(letter: char) -> Option<usize> {
        letter
            .is_ascii_alphabetic()
            .then(|| (letter.to_ascii_uppercase() as u8 - b'A') as usize)
    }
}

/// Set of enabled keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordSet {
    bits: u128,
}

impl KeywordSet {
    /// No keywords.
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// Every keyword of every family.
    pub fn all() -> Self {
        Keyword::ALL.iter().fold(Self::none(), |set, &k| set.with(k))
    }

    /// Every keyword usable from a SPICE-family dialect, including the Spectre
    /// ones needed after a `simulator lang=spectre` switch.
    pub fn spice() -> Self {
        Self::all()
    }

    /// Add a keyword.
    pub const fn with(self, keyword: Keyword) -> Self {
        Self {
            bits: self.bits | keyword.bit(),
        }
    }

    /// Remove a keyword.
    pub const fn without(self, keyword: Keyword) -> Self {
        Self {
            bits: self.bits & !keyword.bit(),
        }
    }

    /// Remove several keywords.
    pub fn without_all(self, keywords: &[Keyword]) -> Self {
        keywords.iter().fold(self, |set, &k| set.without(k))
    }

    /// True when `keyword` is enabled.
    pub const fn contains(&self, keyword: Keyword) -> bool {
        self.bits & keyword.bit() != 0
    }
}

/// Everything that makes one dialect lex and parse differently from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectConfig {
    /// Dialect the preset came from
    pub dialect: Dialect,
    /// Grammar the file starts in
    pub language: Language,
    /// Keyword lookups (SPICE part) respect case
    pub case_sensitive: bool,
    /// Instance-name prefix table
    pub prefixes: PrefixTable,
    /// Enabled keywords
    pub keywords: KeywordSet,
    /// Tighten lenient grammar rules into errors
    pub strict: bool,
    /// The first line of the file is a free-text title
    pub title_line: bool,
    /// Characters that start a comment anywhere on a SPICE line
    pub inline_comments: &'static str,
    /// `8'hFF` style based literals
    pub based_literals: bool,
    /// `'a+b'` quotes an expression
    pub prime_expressions: bool,
    /// Backtick-delimited spans are handed to a foreign evaluator
    pub foreign_escapes: bool,
}

impl DialectConfig {
    /// Preset configuration for a dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        let base = Self {
            dialect,
            language: Language::Spice,
            case_sensitive: false,
            prefixes: PrefixTable::spice3(),
            keywords: KeywordSet::spice(),
            strict: false,
            title_line: false,
            inline_comments: "$;",
            based_literals: true,
            prime_expressions: true,
            foreign_escapes: true,
        };
        match dialect {
            Dialect::Generic => base,
            Dialect::Ngspice => Self {
                keywords: base
                    .keywords
                    .without_all(&[Keyword::Data, Keyword::Enddata]),
                inline_comments: "$;",
                ..base
            },
            Dialect::Hspice => Self {
                prefixes: base
                    .prefixes
                    .with('S', DeviceKind::SParameter)
                    .with('W', DeviceKind::TransmissionLine)
                    .with('B', DeviceKind::Generic),
                keywords: base
                    .keywords
                    .without_all(&[Keyword::Control, Keyword::Endc]),
                inline_comments: "$",
                ..base
            },
            Dialect::Ltspice => Self {
                keywords: base.keywords.without_all(&[
                    Keyword::Control,
                    Keyword::Endc,
                    Keyword::Data,
                    Keyword::Enddata,
                    Keyword::If,
                    Keyword::Elseif,
                    Keyword::Else,
                    Keyword::Endif,
                ]),
                inline_comments: ";",
                based_literals: false,
                ..base
            },
            Dialect::Pspice => Self {
                prefixes: base.prefixes.with('B', DeviceKind::Mesfet).without('Z'),
                keywords: base.keywords.without_all(&[
                    Keyword::Control,
                    Keyword::Endc,
                    Keyword::Data,
                    Keyword::Enddata,
                ]),
                inline_comments: ";",
                based_literals: false,
                ..base
            },
            Dialect::Xyce => Self {
                keywords: base
                    .keywords
                    .without_all(&[Keyword::Control, Keyword::Endc]),
                inline_comments: ";",
                ..base
            },
            // SPICE settings stay live for `simulator lang=spice` sections
            Dialect::Spectre => Self {
                language: Language::Spectre,
                ..base
            },
        }
    }

    /// Turn strict mode on or off.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Treat the first line as a title.
    pub fn with_title_line(mut self, title_line: bool) -> Self {
        self.title_line = title_line;
        self
    }

    /// Start reading the file in `language`.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// True when `keyword` may be recognized while reading `language`.
    pub fn keyword_enabled(&self, keyword: Keyword, language: Language) -> bool {
        let family_ok = match (keyword.family(), language) {
            (KeywordFamily::Both, _) => true,
            (KeywordFamily::Spice, Language::Spice) => true,
            (KeywordFamily::Spectre, Language::Spectre) => true,
            _ => false,
        };
        family_ok && self.keywords.contains(keyword)
    }

    /// Case sensitivity of keyword lookups while reading `language`.
    pub fn case_sensitive_in(&self, language: Language) -> bool {
        match language {
            Language::Spice => self.case_sensitive,
            Language::Spectre => true,
        }
    }
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::for_dialect(Dialect::Generic)
    }
}
