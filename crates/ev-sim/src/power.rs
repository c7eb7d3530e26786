//! Power attribution tree.
//!
//! Each tick the simulator records where the battery's power went. Sources are
//! either a single value or a named group of sub-sources (per drive, per loss
//! mechanism), and every group sums to the value shown for it one level up.

use std::collections::BTreeMap;

/// Source labels used by the simulator ledger.
pub mod labels {
    pub const AERODYNAMIC: &str = "Aerodynamic";
    pub const ROLLING_RESISTANCE: &str = "Rolling Resistance";
    pub const ACCESSORY: &str = "Accessory";
    pub const ACCELERATION: &str = "Acceleration";
    pub const FRICTION_BRAKES: &str = "Friction Brakes";
    pub const DRIVETRAIN: &str = "Drivetrain";
    pub const GEAR_FRICTION: &str = "Gear friction";
    pub const MOTOR_LOSS: &str = "Motor loss";
    pub const BATTERY: &str = "Battery";
    pub const INTERNAL_RESISTANCE: &str = "Internal Resistance";

    /// Top-level sources in presentation order.
    pub const TOP_LEVEL: [&str; 7] = [
        AERODYNAMIC,
        ROLLING_RESISTANCE,
        ACCESSORY,
        ACCELERATION,
        FRICTION_BRAKES,
        DRIVETRAIN,
        BATTERY,
    ];
}

/// A power value (W) or a named breakdown of one.
#[derive(Clone, Debug, PartialEq)]
pub enum PowerBreakdown {
    Leaf(f64),
    Branch(BTreeMap<String, PowerBreakdown>),
}

impl Default for PowerBreakdown {
    fn default() -> Self {
        PowerBreakdown::Branch(BTreeMap::new())
    }
}

impl PowerBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all leaves below this node.
    pub fn total(&self) -> f64 {
        match self {
            PowerBreakdown::Leaf(value) => *value,
            PowerBreakdown::Branch(children) => children.values().map(Self::total).sum(),
        }
    }

    /// Node at a path of source names, if present.
    pub fn get(&self, path: &[&str]) -> Option<&PowerBreakdown> {
        let mut node = self;
        for key in path {
            match node {
                PowerBreakdown::Branch(children) => node = children.get(*key)?,
                PowerBreakdown::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// Total at a path of source names, if present.
    pub fn value(&self, path: &[&str]) -> Option<f64> {
        self.get(path).map(Self::total)
    }

    /// Set a leaf at a path, creating groups along the way. A leaf in the way
    /// of the path is replaced by a group.
    pub fn set(&mut self, path: &[&str], value: f64) {
        let Some((last, parents)) = path.split_last() else {
            *self = PowerBreakdown::Leaf(value);
            return;
        };
        let mut node = self;
        for key in parents {
            node = node
                .children_mut()
                .entry((*key).to_string())
                .or_default();
        }
        node.children_mut()
            .insert((*last).to_string(), PowerBreakdown::Leaf(value));
    }

    fn children_mut(&mut self) -> &mut BTreeMap<String, PowerBreakdown> {
        if let PowerBreakdown::Leaf(_) = self {
            *self = PowerBreakdown::default();
        }
        match self {
            PowerBreakdown::Branch(children) => children,
            PowerBreakdown::Leaf(_) => unreachable!("leaf replaced above"),
        }
    }

    /// Add another breakdown into this one, scaled, leaf by leaf. Used to
    /// average ledgers over many ticks.
    pub fn accumulate(&mut self, other: &PowerBreakdown, scale: f64) {
        match other {
            PowerBreakdown::Leaf(value) => match self {
                PowerBreakdown::Leaf(mine) => *mine += value * scale,
                PowerBreakdown::Branch(children) if children.is_empty() => {
                    *self = PowerBreakdown::Leaf(value * scale);
                }
                PowerBreakdown::Branch(_) => {
                    // Shape mismatch: fold into the group's own total
                    let total = self.total() + value * scale;
                    *self = PowerBreakdown::Leaf(total);
                }
            },
            PowerBreakdown::Branch(theirs) => {
                for (key, child) in theirs {
                    self.children_mut()
                        .entry(key.clone())
                        .or_insert_with(|| PowerBreakdown::Leaf(0.0))
                        .accumulate(child, scale);
                }
            }
        }
    }

    /// Top-level sources present in this breakdown, in [`labels::TOP_LEVEL`] order.
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &PowerBreakdown)> {
        labels::TOP_LEVEL
            .iter()
            .filter_map(|label| self.get(&[*label]).map(|node| (*label, node)))
    }

    /// Flattened `(path, value)` pairs with `/`-joined paths, in key order.
    pub fn leaves(&self) -> Vec<(String, f64)> {
        let mut out = Vec::new();
        self.collect_leaves(String::new(), &mut out);
        out
    }

    fn collect_leaves(&self, prefix: String, out: &mut Vec<(String, f64)>) {
        match self {
            PowerBreakdown::Leaf(value) => out.push((prefix, *value)),
            PowerBreakdown::Branch(children) => {
                for (key, child) in children {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}/{key}")
                    };
                    child.collect_leaves(path, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::labels::*;
    use super::*;

    fn sample() -> PowerBreakdown {
        let mut p = PowerBreakdown::new();
        p.set(&[AERODYNAMIC], 1_000.0);
        p.set(&[ROLLING_RESISTANCE], 500.0);
        p.set(&[DRIVETRAIN, "rear", GEAR_FRICTION], 50.0);
        p.set(&[DRIVETRAIN, "rear", MOTOR_LOSS], 150.0);
        p.set(&[DRIVETRAIN, "front", MOTOR_LOSS], 100.0);
        p.set(&[BATTERY, INTERNAL_RESISTANCE], 20.0);
        p
    }

    #[test]
    fn total_sums_recursively() {
        let p = sample();
        assert!((p.total() - 1_820.0).abs() < 1e-9);
        assert_eq!(p.value(&[DRIVETRAIN]), Some(300.0));
        assert_eq!(p.value(&[DRIVETRAIN, "rear"]), Some(200.0));
        assert_eq!(p.value(&[DRIVETRAIN, "rear", MOTOR_LOSS]), Some(150.0));
        assert_eq!(p.value(&["Missing"]), None);
        assert_eq!(p.value(&[AERODYNAMIC, "deeper"]), None);
    }

    #[test]
    fn set_overwrites_leaf() {
        let mut p = sample();
        p.set(&[AERODYNAMIC], 10.0);
        assert_eq!(p.value(&[AERODYNAMIC]), Some(10.0));
        p.set(&[AERODYNAMIC, "front"], 4.0);
        assert_eq!(p.value(&[AERODYNAMIC]), Some(4.0));
    }

    #[test]
    fn accumulate_averages_ledgers() {
        let mut avg = PowerBreakdown::new();
        let a = sample();
        let mut b = sample();
        b.set(&[AERODYNAMIC], 3_000.0);
        avg.accumulate(&a, 0.5);
        avg.accumulate(&b, 0.5);
        assert!((avg.value(&[AERODYNAMIC]).unwrap() - 2_000.0).abs() < 1e-9);
        assert!((avg.value(&[DRIVETRAIN, "rear"]).unwrap() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn leaves_are_flattened_in_key_order() {
        let leaves = sample().leaves();
        let names: Vec<&str> = leaves.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Aerodynamic",
                "Battery/Internal Resistance",
                "Drivetrain/front/Motor loss",
                "Drivetrain/rear/Gear friction",
                "Drivetrain/rear/Motor loss",
                "Rolling Resistance",
            ]
        );
    }

    #[test]
    fn sections_follow_presentation_order() {
        let mut p = sample();
        p.set(&[ACCESSORY], 300.0);
        let order: Vec<&str> = p.sections().map(|(label, _)| label).collect();
        assert_eq!(
            order,
            vec![AERODYNAMIC, ROLLING_RESISTANCE, ACCESSORY, DRIVETRAIN, BATTERY]
        );
        let (_, drivetrain) = p.sections().nth(3).unwrap();
        assert!((drivetrain.total() - 300.0).abs() < 1e-9);
    }
}
