//! Access structure trees and their compiled byte form (§4.7, §9).
//!
//! The harness validates the structural invariants spec.md lists — `k ≥
//! 1`, `k ≤ |children|`, unique non-empty leaf names, non-empty child
//! lists — before the tree ever reaches `compile`. The compiled form is a
//! small tag-length-value encoding private to this crate; the engine (mock
//! or native) is the only other reader of it.

use cbmpc_types::{Error, Result};

/// An access-structure tree node, as built by a caller before compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessStructure {
    Leaf(String),
    And(Vec<AccessStructure>),
    Or(Vec<AccessStructure>),
    Threshold(u32, Vec<AccessStructure>),
}

const TAG_LEAF: u8 = 1;
const TAG_AND: u8 = 2;
const TAG_OR: u8 = 3;
const TAG_THRESHOLD: u8 = 4;

impl AccessStructure {
    /// Checks every structural invariant spec.md §3/§9 names, recursively.
    pub fn validate(&self) -> Result<()> {
        match self {
            AccessStructure::Leaf(name) => {
                if name.is_empty() {
                    return Err(Error::InvalidArgument(
                        "access structure leaf name must not be empty".into(),
                    ));
                }
                self.check_unique_leaf_names()
            }
            AccessStructure::And(children) | AccessStructure::Or(children) => {
                if children.is_empty() {
                    return Err(Error::InvalidArgument(
                        "And/Or node must have at least one child".into(),
                    ));
                }
                for child in children {
                    child.validate_inner()?;
                }
                self.check_unique_leaf_names()
            }
            AccessStructure::Threshold(k, children) => {
                if children.is_empty() {
                    return Err(Error::InvalidArgument(
                        "Threshold node must have at least one child".into(),
                    ));
                }
                if *k < 1 {
                    return Err(Error::InvalidArgument("threshold k must be >= 1".into()));
                }
                if (*k as usize) > children.len() {
                    return Err(Error::InvalidArgument(format!(
                        "threshold k={k} exceeds child count {}",
                        children.len()
                    )));
                }
                for child in children {
                    child.validate_inner()?;
                }
                self.check_unique_leaf_names()
            }
        }
    }

    /// Like `validate` but without the top-level duplicate-name pass,
    /// which only needs to run once from the tree root.
    fn validate_inner(&self) -> Result<()> {
        match self {
            AccessStructure::Leaf(name) => {
                if name.is_empty() {
                    return Err(Error::InvalidArgument(
                        "access structure leaf name must not be empty".into(),
                    ));
                }
                Ok(())
            }
            AccessStructure::And(children) | AccessStructure::Or(children) => {
                if children.is_empty() {
                    return Err(Error::InvalidArgument(
                        "And/Or node must have at least one child".into(),
                    ));
                }
                children.iter().try_for_each(Self::validate_inner)
            }
            AccessStructure::Threshold(k, children) => {
                if children.is_empty() || *k < 1 || (*k as usize) > children.len() {
                    return Err(Error::InvalidArgument(format!(
                        "invalid threshold node: k={k}, children={}",
                        children.len()
                    )));
                }
                children.iter().try_for_each(Self::validate_inner)
            }
        }
    }

    fn check_unique_leaf_names(&self) -> Result<()> {
        let mut names = Vec::new();
        self.collect_leaf_names(&mut names);
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != names.len() {
            return Err(Error::InvalidArgument(
                "access structure leaf names must be unique within the tree".into(),
            ));
        }
        Ok(())
    }

    fn collect_leaf_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            AccessStructure::Leaf(name) => out.push(name.as_str()),
            AccessStructure::And(children)
            | AccessStructure::Or(children)
            | AccessStructure::Threshold(_, children) => {
                for child in children {
                    child.collect_leaf_names(out);
                }
            }
        }
    }

    /// Compiles a validated tree into its TLV byte form.
    ///
    /// Callers should call [`Self::validate`] first; `compile` re-checks
    /// and returns the same error rather than producing malformed bytes.
    pub fn compile(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut out = Vec::new();
        self.write_tlv(&mut out);
        Ok(out)
    }

    fn write_tlv(&self, out: &mut Vec<u8>) {
        match self {
            AccessStructure::Leaf(name) => {
                out.push(TAG_LEAF);
                let bytes = name.as_bytes();
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            AccessStructure::And(children) => write_branch(out, TAG_AND, None, children),
            AccessStructure::Or(children) => write_branch(out, TAG_OR, None, children),
            AccessStructure::Threshold(k, children) => write_branch(out, TAG_THRESHOLD, Some(*k), children),
        }
    }
}

fn write_branch(out: &mut Vec<u8>, tag: u8, k: Option<u32>, children: &[AccessStructure]) {
    out.push(tag);
    if let Some(k) = k {
        out.extend_from_slice(&k.to_be_bytes());
    }
    out.extend_from_slice(&(children.len() as u32).to_be_bytes());
    for child in children {
        child.write_tlv(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_k_must_not_exceed_children() {
        let tree = AccessStructure::Threshold(
            3,
            vec![
                AccessStructure::Leaf("a".into()),
                AccessStructure::Leaf("b".into()),
            ],
        );
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_threshold_k_zero_rejected() {
        let tree = AccessStructure::Threshold(0, vec![AccessStructure::Leaf("a".into())]);
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_duplicate_leaf_names_rejected() {
        let tree = AccessStructure::Or(vec![
            AccessStructure::Leaf("alice".into()),
            AccessStructure::Leaf("alice".into()),
        ]);
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_empty_children_rejected() {
        assert!(AccessStructure::And(Vec::new()).validate().is_err());
    }

    #[test]
    fn test_valid_tree_compiles() {
        let tree = AccessStructure::Threshold(
            2,
            vec![
                AccessStructure::Leaf("alice".into()),
                AccessStructure::Leaf("bob".into()),
                AccessStructure::And(vec![
                    AccessStructure::Leaf("carol".into()),
                    AccessStructure::Leaf("dave".into()),
                ]),
            ],
        );
        let bytes = tree.compile().expect("valid tree compiles");
        assert!(!bytes.is_empty());
        assert_eq!(bytes[0], TAG_THRESHOLD);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let tree = AccessStructure::And(vec![
            AccessStructure::Leaf("x".into()),
            AccessStructure::Leaf("y".into()),
        ]);
        assert_eq!(tree.compile().expect("valid tree"), tree.compile().expect("valid tree"));
    }
}
