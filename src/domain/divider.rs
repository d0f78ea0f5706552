use serde::{Deserialize, Serialize};

/// The user-authoritative divider map for one page: ascending Y-coordinates,
/// a parallel system-boundary flag per divider, and a strip name per
/// consecutive divider pair.
///
/// Invariants (validated by [`DividerSet::validate`]): `y` strictly
/// increasing; `system_flags.len() == y.len()`; `strip_names.len() ==
/// y.len().saturating_sub(1)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DividerSet {
    #[serde(serialize_with = "round_f32_vec")]
    pub dividers: Vec<f32>,
    pub system_flags: Vec<bool>,
    pub strip_names: Vec<String>,
}

fn round_f32_vec<S>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for v in values {
        seq.serialize_element(&((v * 1000.0).round() / 1000.0))?;
    }
    seq.end()
}

impl DividerSet {
    pub fn validate(&self) -> Result<(), String> {
        if !self.dividers.windows(2).all(|w| w[1] > w[0]) {
            return Err("divider Y-coordinates must be strictly increasing".into());
        }
        if self.system_flags.len() != self.dividers.len() {
            return Err("system_flags length must equal dividers length".into());
        }
        let expected_strips = self.dividers.len().saturating_sub(1);
        if self.strip_names.len() != expected_strips {
            return Err(format!(
                "strip_names length {} must equal dividers.len() - 1 ({})",
                self.strip_names.len(),
                expected_strips
            ));
        }
        Ok(())
    }

    /// Rescales this divider set from display-pixel space into backend-pixel
    /// space, leaving flags and names untouched.
    pub fn to_backend(&self, display_to_backend: f32) -> DividerSet {
        DividerSet {
            dividers: self
                .dividers
                .iter()
                .map(|y| y * display_to_backend)
                .collect(),
            system_flags: self.system_flags.clone(),
            strip_names: self.strip_names.clone(),
        }
    }

    /// The live strips in this page's divider set: for each consecutive pair
    /// `(j, j+1)` not classified dead, returns `(top_y, bottom_y, strip_name,
    /// is_system_start)`.
    ///
    /// A strip between divider `j` and `j+1` is dead when the flag at `j+1`
    /// is a system boundary. `is_system_start` is true iff the flag at `j`
    /// is a system boundary.
    pub fn live_strips(&self) -> Vec<LiveStrip> {
        let mut out = Vec::new();
        for j in 0..self.strip_names.len() {
            let flag_next = self.system_flags.get(j + 1).copied().unwrap_or(false);
            if flag_next {
                continue;
            }
            let is_system_start = self.system_flags.get(j).copied().unwrap_or(false);
            out.push(LiveStrip {
                strip_index: j,
                top_y: self.dividers[j],
                bottom_y: self.dividers[j + 1],
                name: self.strip_names[j].trim().to_string(),
                is_system_start,
            });
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveStrip {
    pub strip_index: usize,
    pub top_y: f32,
    pub bottom_y: f32,
    pub name: String,
    pub is_system_start: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_non_increasing_dividers() {
        let d = DividerSet {
            dividers: vec![10.0, 5.0],
            system_flags: vec![false, false],
            strip_names: vec!["Vln".into()],
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn validate_rejects_mismatched_strip_names() {
        let d = DividerSet {
            dividers: vec![10.0, 20.0, 30.0],
            system_flags: vec![false, false, false],
            strip_names: vec!["Vln".into()],
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn live_strips_skips_dead_gaps() {
        // One system of two staves: divider 0 sits above a leading dead
        // zone (page margin), divider 1 opens the system, divider 3 closes
        // it without opening another, so only strips "b" and "c" survive.
        let d = DividerSet {
            dividers: vec![0.0, 100.0, 110.0, 210.0],
            system_flags: vec![false, true, false, false],
            strip_names: vec!["a".into(), "b".into(), "c".into()],
        };
        let live = d.live_strips();
        assert_eq!(live.len(), 2);
        assert_eq!(live[0].strip_index, 1);
        assert!(live[0].is_system_start);
        assert_eq!(live[1].strip_index, 2);
        assert!(!live[1].is_system_start);
    }

    #[test]
    fn zero_dividers_yields_no_strips() {
        let d = DividerSet::default();
        assert!(d.validate().is_ok());
        assert!(d.live_strips().is_empty());
    }

    #[test]
    fn one_divider_yields_no_strips() {
        let d = DividerSet {
            dividers: vec![5.0],
            system_flags: vec![false],
            strip_names: vec![],
        };
        assert!(d.validate().is_ok());
        assert!(d.live_strips().is_empty());
    }

    #[test]
    fn all_system_boundaries_yields_no_live_strips() {
        let d = DividerSet {
            dividers: vec![0.0, 100.0, 200.0],
            system_flags: vec![true, true, true],
            strip_names: vec!["a".into(), "b".into()],
        };
        assert!(d.live_strips().is_empty());
    }
}
