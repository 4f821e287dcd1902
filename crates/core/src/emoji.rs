//! Emoji pool - the symbols that can be secretly assigned to players

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::models::PlayerId;

/// Symbols used when no custom pool is configured
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "😀", "😃", "😄", "😁", "😆", "😅", "🤣", "😂",
    "🙂", "🙃", "😉", "😊", "😇", "🥰", "😍", "🤩",
    "😘", "😗", "😚", "😙", "🥲", "😋", "😛", "😜",
    "🤪", "😝", "🤑", "🤗", "🤭", "🤫", "🤔", "🤐",
    "🤨", "😐", "😑", "😶", "😏", "😒", "🙄", "😬",
    "🤥", "😌", "😔", "😪", "🤤", "😴", "😷", "🤒",
    "🤕", "🤢", "🤮", "🤧", "🥵", "🥶", "🥴", "😵",
    "🤯", "🤠", "🥳", "🥸", "😎", "🤓", "🧐", "😕",
    "😟", "🙁", "☹️", "😮", "😯", "😲", "😳", "🥺",
    "😦", "😧", "😨", "😰", "😥", "😢", "😭", "😱",
    "😖", "😣", "😞", "😓", "😩", "😫", "🥱", "😤",
    "😡", "😠", "🤬", "😈", "👿", "💀", "☠️", "💩",
    "🤡", "👹", "👺", "👻", "👽", "👾", "🤖", "😺",
    "😸", "😹", "😻", "😼", "😽", "🙀", "😿", "😾",
];

/// A set of unique candidate symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiPool {
    symbols: Vec<String>,
}

impl EmojiPool {
    /// Build a pool, rejecting empty input and repeated symbols
    pub fn new<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(Error::EmptyPool);
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(Error::DuplicateSymbol(symbol.clone()));
            }
        }

        Ok(Self { symbols })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Give each player a distinct symbol drawn without replacement
    pub fn assign<R: Rng + ?Sized>(
        &self,
        players: &[PlayerId],
        rng: &mut R,
    ) -> Result<HashMap<PlayerId, String>> {
        if players.len() > self.symbols.len() {
            return Err(Error::InsufficientSymbols {
                requested: players.len(),
                available: self.symbols.len(),
            });
        }

        let drawn = self.symbols.choose_multiple(rng, players.len());
        Ok(players.iter().cloned().zip(drawn.cloned()).collect())
    }

    /// Selector grid of `count` symbols that always contains `include`
    pub fn options<R: Rng + ?Sized>(&self, count: usize, include: &str, rng: &mut R) -> Vec<String> {
        let mut options = vec![include.to_string()];
        let others: Vec<&String> = self.symbols.iter().filter(|s| *s != include).collect();
        options.extend(
            others
                .choose_multiple(rng, count.saturating_sub(1))
                .map(|s| (*s).clone()),
        );
        options.shuffle(rng);
        options
    }
}

impl Default for EmojiPool {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
