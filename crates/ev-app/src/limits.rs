//! Grouping per-tick limiting reasons into timed spans.

use ev_components::LimitReason;

/// A run of consecutive ticks that shared the same limiting reason.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitSpan {
    /// `None` for ticks where the requested acceleration was met
    pub reason: Option<LimitReason>,
    pub start_s: f64,
    pub duration_s: f64,
}

/// Incremental form of [`summarize_limits`], for runs too long to buffer.
#[derive(Debug, Clone, Default)]
pub struct LimitTracker {
    spans: Vec<LimitSpan>,
    elapsed_s: f64,
}

impl LimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: Option<&LimitReason>, interval_s: f64) {
        match self.spans.last_mut() {
            Some(span) if span.reason.as_ref() == reason => span.duration_s += interval_s,
            _ => self.spans.push(LimitSpan {
                reason: reason.cloned(),
                start_s: self.elapsed_s,
                duration_s: interval_s,
            }),
        }
        self.elapsed_s += interval_s;
    }

    pub fn finish(self) -> Vec<LimitSpan> {
        self.spans
    }
}

/// Collapse a per-tick sequence of limiting reasons into spans of equal reason.
pub fn summarize_limits(limits: &[Option<LimitReason>], interval_s: f64) -> Vec<LimitSpan> {
    let mut tracker = LimitTracker::new();
    for limit in limits {
        tracker.record(limit.as_ref(), interval_s);
    }
    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ev_components::LimitKind;

    #[test]
    fn groups_consecutive_equal_reasons() {
        let grip = Some(LimitReason::on(LimitKind::TireGrip, "rear"));
        let power = Some(LimitReason::on(LimitKind::MotorPower, "rear: rear motor"));
        let ticks = vec![
            grip.clone(),
            grip.clone(),
            grip,
            power.clone(),
            power,
            None,
        ];
        let spans = summarize_limits(&ticks, 0.5);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].reason.as_ref().unwrap().kind, LimitKind::TireGrip);
        assert_eq!(spans[0].start_s, 0.0);
        assert_eq!(spans[0].duration_s, 1.5);
        assert_eq!(spans[1].reason.as_ref().unwrap().kind, LimitKind::MotorPower);
        assert_eq!(spans[1].start_s, 1.5);
        assert_eq!(spans[1].duration_s, 1.0);
        assert!(spans[2].reason.is_none());
        assert_eq!(spans[2].start_s, 2.5);
    }

    #[test]
    fn same_kind_on_different_drives_is_split() {
        let ticks = vec![
            Some(LimitReason::on(LimitKind::TireGrip, "front")),
            Some(LimitReason::on(LimitKind::TireGrip, "rear")),
        ];
        assert_eq!(summarize_limits(&ticks, 1.0).len(), 2);
    }

    #[test]
    fn empty_input_has_no_spans() {
        assert!(summarize_limits(&[], 1.0).is_empty());
    }
}
