//! Random bracket-balanced text for property-based testing of the scope matcher.
//!
//! A `BalancedText` is a sequence of fragments where every group opener is closed by
//! its own closer in properly nested order. Fragments mix identifiers, separators and
//! the three bracket kinds, so a scan for one kind has to step over the others.
//!
//! Generation is depth- and size-bounded; rendered text always stays well under the
//! tightest scan ceiling used for live buffers.

use quickcheck::{Arbitrary, Gen};
use std::fmt;

/// Upper bound on rendered length, below the live-buffer scan ceiling
pub const MAX_RENDERED_LEN: usize = 1500;

const MAX_DEPTH: u32 = 5;

/// Bracket kind of a group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bracket {
    Paren,
    Square,
    Curly,
}

impl Bracket {
    fn delimiters(self) -> (char, char) {
        match self {
            Bracket::Paren => ('(', ')'),
            Bracket::Square => ('[', ']'),
            Bracket::Curly => ('{', '}'),
        }
    }
}

/// One piece of balanced text
#[derive(Clone, Debug)]
pub enum Fragment {
    Ident(String),
    Separator(&'static str),
    Group(Bracket, Vec<Fragment>),
}

impl Fragment {
    fn rendered_len(&self) -> usize {
        match self {
            Fragment::Ident(name) => name.len(),
            Fragment::Separator(sep) => sep.len(),
            Fragment::Group(_, inner) => 2 + inner.iter().map(Fragment::rendered_len).sum::<usize>(),
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Ident(name) => write!(f, "{}", name),
            Fragment::Separator(sep) => write!(f, "{}", sep),
            Fragment::Group(bracket, inner) => {
                let (open, close) = bracket.delimiters();
                write!(f, "{}", open)?;
                for fragment in inner {
                    write!(f, "{}", fragment)?;
                }
                write!(f, "{}", close)
            }
        }
    }
}

/// Text in which every bracket is balanced
#[derive(Clone, Debug)]
pub struct BalancedText {
    pub fragments: Vec<Fragment>,
}

impl BalancedText {
    pub fn rendered_len(&self) -> usize {
        self.fragments.iter().map(Fragment::rendered_len).sum()
    }
}

impl fmt::Display for BalancedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            write!(f, "{}", fragment)?;
        }
        Ok(())
    }
}

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: u32, max: u32) -> u32 {
    min + (u32::arbitrary(g) % (max - min + 1))
}

fn gen_ident(g: &mut Gen) -> String {
    let starters: Vec<char> = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_".chars().collect();
    let continuers: Vec<char> = "abcdefghijklmnopqrstuvwxyz0123456789_".chars().collect();
    let len = gen_range(g, 1, 8);
    let mut name = String::new();
    name.push(*g.choose(&starters).unwrap());
    for _ in 1..len {
        name.push(*g.choose(&continuers).unwrap());
    }
    name
}

fn gen_fragments(g: &mut Gen, depth: u32, budget: &mut usize) -> Vec<Fragment> {
    const SEPARATORS: &[&str] = &[", ", ".", " ", "; ", " + ", "\n"];
    let count = gen_range(g, 0, 6);
    let mut fragments = Vec::new();
    for _ in 0..count {
        if *budget == 0 {
            break;
        }
        let choice = gen_range(g, 0, 9);
        let fragment = if choice < 3 && depth < MAX_DEPTH && *budget >= 2 {
            let bracket = *g.choose(&[Bracket::Paren, Bracket::Square, Bracket::Curly]).unwrap();
            *budget -= 2;
            Fragment::Group(bracket, gen_fragments(g, depth + 1, budget))
        } else if choice < 7 {
            Fragment::Ident(gen_ident(g))
        } else {
            Fragment::Separator(*g.choose(SEPARATORS).unwrap())
        };
        let cost = match &fragment {
            Fragment::Group(..) => 0,
            other => other.rendered_len(),
        };
        if cost > *budget {
            break;
        }
        *budget -= cost;
        fragments.push(fragment);
    }
    fragments
}

impl Arbitrary for BalancedText {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut budget = MAX_RENDERED_LEN;
        let mut fragments = Vec::new();
        // A few top-level rounds so short outputs are not the norm
        for _ in 0..gen_range(g, 1, 4) {
            fragments.extend(gen_fragments(g, 0, &mut budget));
        }
        BalancedText { fragments }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let fragments = self.fragments.clone();
        Box::new((0..fragments.len()).map(move |skip| BalancedText {
            fragments: fragments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, f)| f.clone())
                .collect(),
        }))
    }
}
