//! Reserved words and the prefix trie used to recognize them.
//!
//! The lexer walks [`KEYWORDS`] one byte at a time while it consumes an
//! identifier, so recognizing a keyword costs nothing beyond reading the name.
//! All spellings are stored in lower case; case-insensitive dialects fold the
//! input before stepping.

use std::fmt;

use once_cell::sync::Lazy;

/// Which grammar a keyword belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordFamily {
    /// SPICE dot-commands and device tails
    Spice,
    /// Spectre statements
    Spectre,
    /// Spelled the same in both grammars
    Both,
}

macro_rules! keywords {
    ($($variant:ident => $text:literal, $family:ident;)*) => {
        /// Every reserved word known to any supported grammar.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// All keywords, in declaration order.
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant,)*];

            /// Canonical (lower-case) spelling.
            pub const fn text(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }

            /// Grammar family the keyword is reserved in.
            pub const fn family(self) -> KeywordFamily {
                match self {
                    $(Keyword::$variant => KeywordFamily::$family,)*
                }
            }
        }
    };
}

keywords! {
    // structure
    Model => "model", Both;
    Subckt => "subckt", Both;
    Ends => "ends", Both;
    Include => "include", Both;
    Inc => "inc", Spice;
    Lib => "lib", Spice;
    Endl => "endl", Spice;
    Param => "param", Spice;
    Params => "params", Spice;
    Func => "func", Spice;
    Global => "global", Both;
    End => "end", Spice;
    Title => "title", Spice;
    // analyses and output
    Meas => "meas", Spice;
    Measure => "measure", Spice;
    Tran => "tran", Spice;
    Ac => "ac", Spice;
    Dc => "dc", Spice;
    Op => "op", Spice;
    Noise => "noise", Spice;
    Tf => "tf", Spice;
    Sens => "sens", Spice;
    Four => "four", Spice;
    Pz => "pz", Spice;
    Disto => "disto", Spice;
    Step => "step", Spice;
    Option => "option", Spice;
    Options => "options", Spice;
    Opt => "opt", Spice;
    Temp => "temp", Spice;
    Ic => "ic", Spice;
    Nodeset => "nodeset", Spice;
    Print => "print", Spice;
    Plot => "plot", Spice;
    Probe => "probe", Spice;
    Save => "save", Spice;
    // blocks
    If => "if", Spice;
    Elseif => "elseif", Spice;
    Else => "else", Spice;
    Endif => "endif", Spice;
    Data => "data", Spice;
    Enddata => "enddata", Spice;
    Control => "control", Spice;
    Endc => "endc", Spice;
    // device tails
    Pulse => "pulse", Spice;
    Sin => "sin", Spice;
    Exp => "exp", Spice;
    Pwl => "pwl", Spice;
    Sffm => "sffm", Spice;
    Am => "am", Spice;
    Poly => "poly", Spice;
    Value => "value", Spice;
    Table => "table", Spice;
    On => "on", Spice;
    Off => "off", Spice;
    // spectre
    Simulator => "simulator", Both;
    Parameters => "parameters", Spectre;
    AhdlInclude => "ahdl_include", Spectre;
    Inline => "inline", Spectre;
    Section => "section", Spectre;
    Endsection => "endsection", Spectre;
    Library => "library", Spectre;
    Endlibrary => "endlibrary", Spectre;
}

impl Keyword {
    /// Bit position inside a [`crate::dialect::KeywordSet`].
    pub(crate) const fn bit(self) -> u128 {
        1u128 << (self as u32)
    }

    /// Keywords that introduce an analysis statement.
    pub fn is_analysis(self) -> bool {
        matches!(
            self,
            Keyword::Tran
                | Keyword::Ac
                | Keyword::Dc
                | Keyword::Op
                | Keyword::Noise
                | Keyword::Tf
                | Keyword::Sens
                | Keyword::Four
                | Keyword::Pz
                | Keyword::Disto
                | Keyword::Step
        )
    }

    /// Keywords that name an independent-source transient function.
    pub fn is_transient_function(self) -> bool {
        matches!(
            self,
            Keyword::Pulse
                | Keyword::Sin
                | Keyword::Exp
                | Keyword::Pwl
                | Keyword::Sffm
                | Keyword::Am
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text().to_ascii_uppercase())
    }
}

/// The keyword trie shared by every parse.
pub static KEYWORDS: Lazy<KeywordTrie> = Lazy::new(|| KeywordTrie::build(Keyword::ALL));

#[derive(Debug, Default)]
struct TrieNode {
    edges: Vec<(u8, u32)>,
    keyword: Option<Keyword>,
}

/// Byte-wise prefix trie of keyword spellings.
#[derive(Debug)]
pub struct KeywordTrie {
    nodes: Vec<TrieNode>,
}

impl KeywordTrie {
    /// Build a trie holding the given keywords.
    pub fn build(keywords: &[Keyword]) -> Self {
        let mut trie = Self {
            nodes: vec![TrieNode::default()],
        };
        for &keyword in keywords {
            let mut node = 0usize;
            for byte in keyword.text().bytes() {
                node = match trie.nodes[node].edges.iter().find(|(b, _)| *b == byte) {
                    Some(&(_, next)) => next as usize,
                    None => {
                        let next = trie.nodes.len();
                        trie.nodes.push(TrieNode::default());
                        trie.nodes[node].edges.push((byte, next as u32));
                        next
                    }
                };
            }
            trie.nodes[node].keyword = Some(keyword);
        }
        trie
    }

    /// A cursor positioned at the root.
    pub fn cursor(&self) -> TrieCursor<'_> {
        TrieCursor {
            trie: self,
            node: Some(0),
        }
    }

    /// Exact lookup of a whole word.
    pub fn lookup(&self, word: &str, case_sensitive: bool) -> Option<Keyword> {
        let mut cursor = self.cursor();
        for ch in word.chars() {
            cursor.step(ch, case_sensitive);
        }
        cursor.keyword()
    }
}

/// A walk through the trie, advanced one character at a time.
#[derive(Debug, Clone, Copy)]
pub struct TrieCursor<'t> {
    trie: &'t KeywordTrie,
    node: Option<u32>,
}

impl TrieCursor<'_> {
    /// Follow the edge for `ch`; the cursor dies when no keyword continues with it.
    pub fn step(&mut self, ch: char, case_sensitive: bool) {
        let Some(node) = self.node else {
            return;
        };
        if !ch.is_ascii() {
            self.node = None;
            return;
        }
        let byte = if case_sensitive {
            ch as u8
        } else {
            ch.to_ascii_lowercase() as u8
        };
        self.node = self.trie.nodes[node as usize]
            .edges
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|&(_, next)| next);
    }

    /// The keyword spelled by the characters stepped so far, if any.
    pub fn keyword(&self) -> Option<Keyword> {
        self.node
            .and_then(|node| self.trie.nodes[node as usize].keyword)
    }
}
