//! Side-by-side comparison of two [`RetargetConfig`]s.
//!
//! [`diff`] never fails and never mutates its inputs. Keys are reported in
//! sorted order; a key present on one side only is [`Presence::OnlyA`] or
//! [`Presence::OnlyB`]. The [`Display`](fmt::Display) impl renders the
//! comparison as fixed-width text tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use retarget_model::{QuatOrder, quat_to_array};

use crate::record::{MatchEntry, RetargetConfig};

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Where a key was found.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence<T> {
    Both(T, T),
    OnlyA(T),
    OnlyB(T),
}

impl<T> Presence<T> {
    pub const fn a(&self) -> Option<&T> {
        match self {
            Self::Both(a, _) | Self::OnlyA(a) => Some(a),
            Self::OnlyB(_) => None,
        }
    }

    pub const fn b(&self) -> Option<&T> {
        match self {
            Self::Both(_, b) | Self::OnlyB(b) => Some(b),
            Self::OnlyA(_) => None,
        }
    }

    pub const fn is_both(&self) -> bool {
        matches!(self, Self::Both(..))
    }

    /// `f(b) - f(a)` when the key is on both sides.
    fn delta(&self, f: impl Fn(&T) -> f64) -> Option<f64> {
        match self {
            Self::Both(a, b) => Some(f(b) - f(a)),
            _ => None,
        }
    }
}

fn merge<T: Clone>(
    a: &BTreeMap<String, T>,
    b: &BTreeMap<String, T>,
) -> Vec<(String, Presence<T>)> {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let presence = match (a.get(key), b.get(key)) {
                (Some(x), Some(y)) => Presence::Both(x.clone(), y.clone()),
                (Some(x), None) => Presence::OnlyA(x.clone()),
                (None, Some(y)) => Presence::OnlyB(y.clone()),
                (None, None) => return None,
            };
            Some((key.clone(), presence))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One `human_scale_table` key.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDiff {
    pub key: String,
    pub presence: Presence<f64>,
}

impl ScaleDiff {
    pub fn delta(&self) -> Option<f64> {
        self.presence.delta(|v| *v)
    }
}

/// One IK match table key.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDiff {
    pub key: String,
    pub presence: Presence<MatchEntry>,
}

impl EntryDiff {
    pub fn position_delta(&self) -> Option<f64> {
        self.presence.delta(|e| e.position_weight)
    }

    pub fn rotation_delta(&self) -> Option<f64> {
        self.presence.delta(|e| e.rotation_weight)
    }

    /// Angle in radians between the two rotation offsets.
    pub fn offset_angle(&self) -> Option<f64> {
        match &self.presence {
            Presence::Both(a, b) => Some(a.rotation_offset.angle_to(&b.rotation_offset)),
            _ => None,
        }
    }

    /// Whether both sides track a different human body.
    pub fn human_changed(&self) -> bool {
        matches!(&self.presence, Presence::Both(a, b) if a.human_body != b.human_body)
    }

    fn is_identical(&self) -> bool {
        matches!(&self.presence, Presence::Both(a, b) if a == b)
    }
}

/// Differences in the scalar header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDiff {
    pub robot_root: Presence<String>,
    pub human_root: Presence<String>,
    /// `b - a`.
    pub ground_height_delta: f64,
    /// `b - a`.
    pub human_height_delta: f64,
    pub use_table1: (bool, bool),
    pub use_table2: (bool, bool),
}

impl HeaderDiff {
    fn new(a: &RetargetConfig, b: &RetargetConfig) -> Self {
        Self {
            robot_root: Presence::Both(a.robot_root_name.clone(), b.robot_root_name.clone()),
            human_root: Presence::Both(a.human_root_name.clone(), b.human_root_name.clone()),
            ground_height_delta: b.ground_height - a.ground_height,
            human_height_delta: b.human_height_assumption - a.human_height_assumption,
            use_table1: (a.use_ik_match_table1, b.use_ik_match_table1),
            use_table2: (a.use_ik_match_table2, b.use_ik_match_table2),
        }
    }

    pub fn roots_changed(&self) -> bool {
        self.robot_root.a() != self.robot_root.b() || self.human_root.a() != self.human_root.b()
    }

    #[allow(clippy::float_cmp)]
    fn is_identical(&self) -> bool {
        !self.roots_changed()
            && self.ground_height_delta == 0.0
            && self.human_height_delta == 0.0
            && self.use_table1.0 == self.use_table1.1
            && self.use_table2.0 == self.use_table2.1
    }
}

// ---------------------------------------------------------------------------
// ConfigDiff
// ---------------------------------------------------------------------------

/// Result of [`diff`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDiff {
    pub header: HeaderDiff,
    pub scales: Vec<ScaleDiff>,
    pub table1: Vec<EntryDiff>,
    pub table2: Vec<EntryDiff>,
}

impl ConfigDiff {
    /// True when both configs carry exactly the same content.
    #[allow(clippy::float_cmp)]
    pub fn is_identical(&self) -> bool {
        self.header.is_identical()
            && self.scales.iter().all(|s| s.delta() == Some(0.0))
            && self.table1.iter().all(EntryDiff::is_identical)
            && self.table2.iter().all(EntryDiff::is_identical)
    }

    /// Keys, across all three tables, that are present on one side only.
    pub fn missing_keys(&self) -> usize {
        self.scales.iter().filter(|s| !s.presence.is_both()).count()
            + self.table1.iter().filter(|e| !e.presence.is_both()).count()
            + self.table2.iter().filter(|e| !e.presence.is_both()).count()
    }
}

/// Compare `a` against `b`. Deltas are `b - a`.
pub fn diff(a: &RetargetConfig, b: &RetargetConfig) -> ConfigDiff {
    ConfigDiff {
        header: HeaderDiff::new(a, b),
        scales: merge(&a.human_scale_table, &b.human_scale_table)
            .into_iter()
            .map(|(key, presence)| ScaleDiff { key, presence })
            .collect(),
        table1: entry_rows(&a.ik_match_table1, &b.ik_match_table1),
        table2: entry_rows(&a.ik_match_table2, &b.ik_match_table2),
    }
}

fn entry_rows(
    a: &BTreeMap<String, MatchEntry>,
    b: &BTreeMap<String, MatchEntry>,
) -> Vec<EntryDiff> {
    merge(a, b)
        .into_iter()
        .map(|(key, presence)| EntryDiff { key, presence })
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Every cell starts with a space so adjacent columns never touch.
struct Optional(Option<f64>);

impl fmt::Display for Optional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, " {v:8.2}"),
            None => write!(f, " {:>8}", "--"),
        }
    }
}

const ENTRY_RULE: usize = 168;

fn quat_cell(entry: Option<&MatchEntry>) -> String {
    entry.map_or_else(
        || "[--]".to_owned(),
        |e| {
            let q = quat_to_array(QuatOrder::Wxyz, &e.rotation_offset);
            format!("[{:+.2}, {:+.2}, {:+.2}, {:+.2}]", q[0], q[1], q[2], q[3])
        },
    )
}

fn write_entries(f: &mut fmt::Formatter<'_>, title: &str, rows: &[EntryDiff]) -> fmt::Result {
    writeln!(f, "\n{title} differences")?;
    writeln!(f, "{}", "-".repeat(ENTRY_RULE))?;
    writeln!(
        f,
        "{:<18} {:<16} {:<16} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>30} {:>30}",
        "Robot Part",
        "Human (A)",
        "Human (B)",
        "Pos A",
        "Pos B",
        "ΔP",
        "Rot A",
        "Rot B",
        "ΔR",
        "Quat A",
        "Quat B"
    )?;
    writeln!(f, "{}", "-".repeat(ENTRY_RULE))?;
    for row in rows {
        let (a, b) = (row.presence.a(), row.presence.b());
        writeln!(
            f,
            "{:<18} {:<16} {:<16}{}{}{}{}{}{} {:>30} {:>30}",
            row.key,
            a.map_or("--", |e| e.human_body.as_str()),
            b.map_or("--", |e| e.human_body.as_str()),
            Optional(a.map(|e| e.position_weight)),
            Optional(b.map(|e| e.position_weight)),
            Optional(row.position_delta()),
            Optional(a.map(|e| e.rotation_weight)),
            Optional(b.map(|e| e.rotation_weight)),
            Optional(row.rotation_delta()),
            quat_cell(a),
            quat_cell(b),
        )?;
    }
    Ok(())
}

impl fmt::Display for ConfigDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        writeln!(f, "{}", "=".repeat(72))?;
        writeln!(f, "IK Configuration Comparison")?;
        writeln!(f, "{}", "=".repeat(72))?;
        for (label, p) in [("Robot root", &h.robot_root), ("Human root", &h.human_root)] {
            writeln!(
                f,
                "{label:<24}{:<16} {:<16}",
                p.a().map_or("--", String::as_str),
                p.b().map_or("--", String::as_str)
            )?;
        }
        writeln!(f, "{:<24}{:+.3}", "Ground height Δ", h.ground_height_delta)?;
        writeln!(f, "{:<24}{:+.3}", "Human height Δ", h.human_height_delta)?;
        writeln!(f, "{:<24}{:<16} {:<16}", "Use table 1", h.use_table1.0, h.use_table1.1)?;
        writeln!(f, "{:<24}{:<16} {:<16}", "Use table 2", h.use_table2.0, h.use_table2.1)?;

        writeln!(f, "\nHuman Scale Table")?;
        writeln!(f, "{}", "-".repeat(72))?;
        writeln!(
            f,
            "{:<18} {:>10}{:>10}{:>12}",
            "Body Part", "Config A", "Config B", "Δ (B - A)"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;
        for row in &self.scales {
            writeln!(
                f,
                "{:<18} {:>10}{:>10}{:>12}",
                row.key,
                Optional(row.presence.a().copied()).to_string(),
                Optional(row.presence.b().copied()).to_string(),
                Optional(row.delta()).to_string(),
            )?;
        }

        write_entries(f, "ik_match_table1", &self.table1)?;
        write_entries(f, "ik_match_table2", &self.table2)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn config(
        robot_root: &str,
        scales: &[(&str, f64)],
        entries: &[(&str, &str, f64)],
    ) -> RetargetConfig {
        let table1: BTreeMap<String, MatchEntry> = entries
            .iter()
            .map(|(robot, human, w)| {
                ((*robot).to_owned(), MatchEntry::new(*human, *w, *w / 5.0))
            })
            .collect();
        let table2 = table1
            .iter()
            .map(|(k, e)| (k.clone(), e.scaled(0.6)))
            .collect();
        RetargetConfig {
            robot_root_name: robot_root.into(),
            human_root_name: "pelvis".into(),
            ground_height: 0.0,
            human_height_assumption: 1.8,
            use_ik_match_table1: true,
            use_ik_match_table2: true,
            human_scale_table: scales.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect(),
            ik_match_table1: table1,
            ik_match_table2: table2,
        }
    }

    fn sample() -> RetargetConfig {
        config(
            "torso",
            &[("pelvis", 0.8), ("left_foot", 0.8)],
            &[("torso", "pelvis", 300.0), ("l_foot", "left_foot", 300.0)],
        )
    }

    #[test]
    fn self_diff_is_all_zero() {
        let c = sample();
        let d = diff(&c, &c);
        assert!(d.is_identical());
        assert_eq!(d.missing_keys(), 0);
        assert!(d.scales.iter().all(|s| s.delta() == Some(0.0)));
        for row in d.table1.iter().chain(&d.table2) {
            assert_eq!(row.position_delta(), Some(0.0));
            assert_eq!(row.rotation_delta(), Some(0.0));
            assert_relative_eq!(row.offset_angle().unwrap(), 0.0);
            assert!(!row.human_changed());
        }
        assert_relative_eq!(d.header.ground_height_delta, 0.0);
        assert!(!d.header.roots_changed());
    }

    #[test]
    fn disjoint_configs_report_every_key_missing() {
        let a = sample();
        let b = config("base", &[("head", 0.7)], &[("head_link", "head", 80.0)]);
        let d = diff(&a, &b);

        assert!(!d.is_identical());
        assert_eq!(d.scales.len(), 3);
        assert_eq!(d.table1.len(), 3);
        assert_eq!(d.missing_keys(), 3 + 3 + 3);
        assert!(d.scales.iter().all(|s| s.delta().is_none()));

        let head = d.scales.iter().find(|s| s.key == "head").unwrap();
        assert_eq!(head.presence, Presence::OnlyB(0.7));
        let torso = d.table1.iter().find(|e| e.key == "torso").unwrap();
        assert!(matches!(torso.presence, Presence::OnlyA(_)));
        assert!(d.header.roots_changed());
    }

    #[test]
    fn deltas_are_b_minus_a() {
        let a = sample();
        let mut b = sample();
        *b.human_scale_table.get_mut("pelvis").unwrap() = 1.0;
        b.ik_match_table1.get_mut("torso").unwrap().position_weight = 450.0;
        b.ik_match_table1.get_mut("l_foot").unwrap().human_body = "right_foot".into();
        b.ik_match_table1.get_mut("l_foot").unwrap().rotation_offset =
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5);
        b.ground_height = 0.02;

        let d = diff(&a, &b);
        let pelvis = d.scales.iter().find(|s| s.key == "pelvis").unwrap();
        assert_relative_eq!(pelvis.delta().unwrap(), 0.2, epsilon = 1e-12);

        let torso = d.table1.iter().find(|e| e.key == "torso").unwrap();
        assert_relative_eq!(torso.position_delta().unwrap(), 150.0);
        assert_relative_eq!(torso.rotation_delta().unwrap(), 0.0);

        let foot = d.table1.iter().find(|e| e.key == "l_foot").unwrap();
        assert!(foot.human_changed());
        assert_relative_eq!(foot.offset_angle().unwrap(), 0.5, epsilon = 1e-9);

        assert_relative_eq!(d.header.ground_height_delta, 0.02);
        assert!(!d.is_identical());
    }

    #[test]
    fn keys_are_sorted() {
        let a = config("torso", &[("b", 1.0), ("a", 1.0)], &[]);
        let b = config("torso", &[("c", 1.0)], &[]);
        let keys: Vec<_> = diff(&a, &b).scales.into_iter().map(|s| s.key).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn rendered_table() {
        let a = sample();
        let b = config("torso", &[("pelvis", 0.9)], &[("torso", "pelvis", 450.0)]);
        let text = diff(&a, &b).to_string();

        assert!(text.contains("Human Scale Table"));
        assert!(text.contains("ik_match_table1 differences"));
        assert!(text.contains("ik_match_table2 differences"));
        let pelvis = text.lines().find(|l| l.starts_with("pelvis")).unwrap();
        assert!(pelvis.contains("0.80"));
        assert!(pelvis.contains("0.90"));
        assert!(pelvis.contains("0.10"));
        let foot = text.lines().find(|l| l.starts_with("left_foot")).unwrap();
        assert!(foot.contains("--"));
        assert!(text.contains("[+1.00, +0.00, +0.00, +0.00]"));
    }

    #[test]
    fn rendered_columns_stay_separated() {
        let long = config(
            "torso",
            &[("right_shoulder", 0.7)],
            &[("r_prox_shoulder", "right_shoulder", 1000.0)],
        );
        let text = diff(&long, &long).to_string();

        let row = text
            .lines()
            .find(|l| l.starts_with("r_prox_shoulder"))
            .unwrap();
        let cells: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(cells[1], "right_shoulder");
        assert_eq!(cells[2], "right_shoulder");
        assert_eq!(cells[3], "1000.00");
        assert_eq!(cells[4], "1000.00");
        assert_eq!(cells[5], "0.00");
        // ΔR is followed by its own quaternion cell.
        assert_eq!(cells[8], "0.00");
        assert_eq!(cells[9], "[+1.00,");
        assert!(!row.contains("0.00["));

        let header = text.lines().find(|l| l.starts_with("Robot Part")).unwrap();
        assert!(header.chars().count() <= ENTRY_RULE);
        assert_eq!(row.chars().count(), header.chars().count());
    }
}
