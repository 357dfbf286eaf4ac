//! Identifier generation and name deduplication
//!
//! Turns arbitrary schema strings into valid, cased Go identifiers, and
//! runs the post-resolution pass that renames colliding type names using
//! ancestor context until every descriptor name is unique.

use tracing::debug;

use super::config::NamingConfig;
use crate::error::{GeneratorError, Result};
use crate::graph::{TypeGraph, TypePath};

/// Generate a valid identifier from an arbitrary source string.
///
/// Words are split on dash/underscore boundaries and on lower-to-upper
/// camel transitions, title-cased (or upper-cased for known acronyms),
/// and joined. Unexported identifiers lower-case the whole first word.
/// Characters that cannot appear in an identifier are stripped; an empty
/// result is a hard error, never a placeholder.
pub fn generate_identifier(
    orig_name: &str,
    exported: bool,
    naming: &NamingConfig,
) -> Result<String> {
    let mut words: Vec<String> = split_words(orig_name)
        .iter()
        .map(|word| cased_word(word, naming))
        .collect();
    if !exported {
        if let Some(first) = words.first_mut() {
            *first = first.to_lowercase();
        }
    }
    let raw = words.concat();

    let mut identifier = String::with_capacity(raw.len());
    for (position, c) in raw.chars().enumerate() {
        if c.is_alphabetic() || c == '_' || (c.is_numeric() && position > 0) {
            identifier.push(c);
        }
    }

    if identifier.is_empty() {
        return Err(GeneratorError::EmptyIdentifier {
            input: orig_name.to_string(),
        });
    }
    Ok(identifier)
}

fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if c == '-' || c == '_' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else {
            if prev_lower && c.is_uppercase() {
                words.push(std::mem::take(&mut current));
            }
            current.push(c);
            prev_lower = c.is_lowercase() || c.is_numeric();
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn cased_word(word: &str, naming: &NamingConfig) -> String {
    let upper = word.to_uppercase();
    if naming.acronyms.contains(&upper) {
        return upper;
    }
    // title-case: a letter at the word start, or after a non-letter, is
    // upper-cased; everything else is lowered
    let mut result = String::with_capacity(word.len());
    let mut prev_is_letter = false;
    for c in word.to_lowercase().chars() {
        if c.is_alphabetic() && !prev_is_letter {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        prev_is_letter = c.is_alphabetic();
    }
    result
}

/// Singularize a container name for its element type. When no plural
/// suffix can be stripped, an `Item` suffix is appended instead so the
/// element name still differs from the container's.
pub fn singularize(plural: &str) -> String {
    let singular = strip_plural(plural);
    if singular == plural {
        format!("{}Item", plural)
    } else {
        singular
    }
}

fn strip_plural(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

impl TypeGraph {
    /// Rename colliding descriptors until every name is unique.
    ///
    /// Rounds over the name registry: a colliding path whose parent's
    /// name is itself still colliding is postponed, so parents stabilize
    /// before children and no child is renamed twice for one collision.
    /// Everything else is renamed by prefixing the parent's original name
    /// and regenerating the identifier. A collision whose parent has no
    /// usable original name cannot be disambiguated and fails; so does a
    /// run whose round count exceeds the descriptor count, which bounds
    /// the fixpoint for inherently ambiguous documents (two colliding
    /// siblings whose parents carry the same original name).
    pub fn dedupe_names(&mut self) -> Result<()> {
        let max_rounds = self.descriptors.len() + 1;
        let mut round = 0usize;
        loop {
            let collisions = self.names.collisions();
            if collisions.is_empty() {
                return Ok(());
            }
            round += 1;
            debug!(round, names = collisions.len(), "renaming colliding types");
            if round > max_rounds {
                return Err(GeneratorError::AmbiguousNames {
                    paths: collisions.into_iter().flat_map(|(_, paths)| paths).collect(),
                });
            }

            let mut progressed = false;
            for (name, paths) in &collisions {
                for path in paths {
                    let descriptor = match self.descriptors.get(path) {
                        Some(d) => d,
                        None => continue,
                    };
                    if descriptor.name != *name {
                        continue;
                    }
                    let parent_path = descriptor.parent.clone();
                    let own_orig = descriptor.orig_name.clone();

                    let parent = if parent_path.is_empty() {
                        None
                    } else {
                        self.descriptors.get(&parent_path)
                    };
                    let (parent_name, parent_orig) = match parent {
                        Some(p) => (p.name.clone(), p.orig_name.clone()),
                        None => {
                            return Err(GeneratorError::AmbiguousNames {
                                paths: paths.clone(),
                            });
                        }
                    };

                    // stabilize parents before children
                    if parent_name != *name && self.names.is_colliding(&parent_name) {
                        continue;
                    }
                    if parent_orig.is_empty() {
                        return Err(GeneratorError::AmbiguousNames {
                            paths: paths.clone(),
                        });
                    }

                    let new_orig = format!("{}-{}", parent_orig, own_orig);
                    let new_name = self.config.type_name(&new_orig)?;

                    self.names.remove(name, path);
                    self.names.add(new_name.clone(), path.clone());
                    if let Some(descriptor) = self.descriptors.get_mut(path) {
                        descriptor.orig_name = new_orig;
                        descriptor.name = new_name;
                    }
                    progressed = true;
                }
            }

            if !progressed {
                let stuck: Vec<TypePath> = self
                    .names
                    .collisions()
                    .into_iter()
                    .flat_map(|(_, paths)| paths)
                    .collect();
                return Err(GeneratorError::AmbiguousNames { paths: stuck });
            }
        }
    }
}
