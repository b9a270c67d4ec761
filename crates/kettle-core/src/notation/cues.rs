//! Explicit notation cues.
//!
//! [`scan_notation`] pulls out the structural notation an athlete or coach
//! wrote down (`3x10`, `8-12`, `@ 80%`, `RPE 8`, `4 rounds`, `90s`, `15+5+5`,
//! `3.3.3`, `21-15-9`) so adapter instructions can point the model at it.
//!
//! Rules claim spans in a fixed order. A later rule never reports a match
//! overlapping an earlier claim, so `3x8-12` is one sets-by-reps cue rather
//! than a sets cue plus a rep range.

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// One piece of structural notation found in a workout text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotationCue {
    /// `3x10`, `4 x 8-12`.
    SetsReps { sets: u32, reps: String },
    /// `8-12` on its own.
    RepRange { low: u32, high: u32 },
    /// `80%`, `70-75%`.
    Percentage { value: String },
    /// `RPE 8`, `@RPE 7.5-8`.
    Rpe { value: String },
    /// `4 rounds`, `5 rds`.
    Rounds { count: u32 },
    /// `90s`, `20 min`, `1:30`, normalized to seconds.
    TimeDomain { seconds: u32 },
    /// `15+5+5`: a big set followed by smaller mini-sets.
    RestPause { segments: Vec<u32> },
    /// `1+1+1`: several movements chained into one set.
    Complex { segments: Vec<u32> },
    /// `3.3.3`: reps split by short intra-set rests.
    Cluster { segments: Vec<u32> },
    /// `21-15-9`, `1-2-3-4-5`: monotonic rep sequences.
    Ladder { steps: Vec<u32> },
    /// `1-2-3-2-1`: up to a peak and back down.
    Pyramid { steps: Vec<u32> },
}

impl fmt::Display for NotationCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetsReps { sets, reps } => write!(f, "{sets} sets of {reps} reps"),
            Self::RepRange { low, high } => write!(f, "rep range {low}-{high}"),
            Self::Percentage { value } => write!(f, "{value}% of 1RM"),
            Self::Rpe { value } => write!(f, "RPE {value}"),
            Self::Rounds { count } => write!(f, "{count} rounds"),
            Self::TimeDomain { seconds } => write!(f, "time domain {seconds}s"),
            Self::RestPause { segments } => write!(f, "rest-pause {}", join(segments, "+")),
            Self::Complex { segments } => write!(f, "complex {}", join(segments, "+")),
            Self::Cluster { segments } => write!(f, "cluster {}", join(segments, ".")),
            Self::Ladder { steps } => write!(f, "ladder {}", join(steps, "-")),
            Self::Pyramid { steps } => write!(f, "pyramid {}", join(steps, "-")),
        }
    }
}

fn join(values: &[u32], sep: &str) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

type Extract = fn(&Captures<'_>) -> Option<NotationCue>;

/// Scanning rules in claim order.
static RULES: LazyLock<Vec<(Regex, Extract)>> = LazyLock::new(|| {
    let rules: [(&str, Extract); 8] = [
        (r"\b(\d+)\s*[x×]\s*(\d+(?:\s*-\s*\d+)?)\b", sets_reps),
        (r"(\d+(?:\.\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?)\s*%", percentage),
        (r"\brpe\s*(\d+(?:\.\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?)", rpe),
        (r"\b\d+(?:\.\d+){2,}\b", cluster),
        (r"\b\d+(?:\s*\+\s*\d+)+\b", plus_chain),
        (r"\b\d+(?:\s*-\s*\d+)+\b", dash_sequence),
        (r"\b(\d+)\s*(?:rounds?|rds?|rft|circuits?)\b", rounds),
        (
            r"\b(\d+)\s*(hours?|hrs?|minutes?|mins?|seconds?|secs?|s)\b|\b(\d{1,2}):(\d{2})\b",
            time_domain,
        ),
    ];
    rules
        .into_iter()
        .map(|(pattern, extract)| {
            let regex = Regex::new(&format!("(?i){pattern}"))
                .expect("notation cue patterns are valid regexes");
            (regex, extract)
        })
        .collect()
});

/// Extract every recognised notation cue from `text`, in text order.
pub fn scan_notation(text: &str) -> Vec<NotationCue> {
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut found: Vec<(usize, NotationCue)> = Vec::new();

    for (regex, extract) in RULES.iter() {
        for caps in regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let span = whole.range();
            if claimed.iter().any(|c| c.start < span.end && span.start < c.end) {
                continue;
            }
            if let Some(cue) = extract(&caps) {
                claimed.push(span.clone());
                found.push((span.start, cue));
            }
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, cue)| cue).collect()
}

fn numbers(s: &str, sep: char) -> Option<Vec<u32>> {
    s.split(sep).map(|n| n.trim().parse().ok()).collect()
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn sets_reps(caps: &Captures<'_>) -> Option<NotationCue> {
    Some(NotationCue::SetsReps {
        sets: caps[1].parse().ok()?,
        reps: compact(&caps[2]),
    })
}

fn percentage(caps: &Captures<'_>) -> Option<NotationCue> {
    Some(NotationCue::Percentage {
        value: compact(&caps[1]),
    })
}

fn rpe(caps: &Captures<'_>) -> Option<NotationCue> {
    Some(NotationCue::Rpe {
        value: compact(&caps[1]),
    })
}

fn cluster(caps: &Captures<'_>) -> Option<NotationCue> {
    Some(NotationCue::Cluster {
        segments: numbers(&caps[0], '.')?,
    })
}

fn plus_chain(caps: &Captures<'_>) -> Option<NotationCue> {
    let segments = numbers(&caps[0], '+')?;
    let (first, rest) = segments.split_first()?;
    if rest.iter().all(|n| n < first) {
        Some(NotationCue::RestPause { segments })
    } else {
        Some(NotationCue::Complex { segments })
    }
}

fn dash_sequence(caps: &Captures<'_>) -> Option<NotationCue> {
    let steps = numbers(&caps[0], '-')?;
    match steps.as_slice() {
        [low, high] => Some(NotationCue::RepRange {
            low: *low,
            high: *high,
        }),
        _ if is_pyramid(&steps) => Some(NotationCue::Pyramid { steps }),
        _ => Some(NotationCue::Ladder { steps }),
    }
}

/// Strictly rises to a peak then strictly falls, with both sides present.
fn is_pyramid(steps: &[u32]) -> bool {
    let Some(peak) = steps
        .iter()
        .enumerate()
        .max_by_key(|(_, v)| **v)
        .map(|(i, _)| i)
    else {
        return false;
    };
    if peak == 0 || peak == steps.len() - 1 {
        return false;
    }
    steps[..=peak].windows(2).all(|w| w[0] < w[1])
        && steps[peak..].windows(2).all(|w| w[0] > w[1])
}

fn rounds(caps: &Captures<'_>) -> Option<NotationCue> {
    Some(NotationCue::Rounds {
        count: caps[1].parse().ok()?,
    })
}

fn time_domain(caps: &Captures<'_>) -> Option<NotationCue> {
    if let (Some(min), Some(sec)) = (caps.get(3), caps.get(4)) {
        let min: u32 = min.as_str().parse().ok()?;
        let sec: u32 = sec.as_str().parse().ok()?;
        return Some(NotationCue::TimeDomain {
            seconds: min * 60 + sec,
        });
    }
    let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    let factor = match unit.chars().next()? {
        'h' => 3600,
        'm' => 60,
        _ => 1,
    };
    Some(NotationCue::TimeDomain {
        seconds: amount.checked_mul(factor)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_reps_claims_its_range() {
        assert_eq!(
            scan_notation("Bench 4x8-12"),
            vec![NotationCue::SetsReps {
                sets: 4,
                reps: "8-12".into()
            }]
        );
        assert_eq!(
            scan_notation("Squat 5 x 5"),
            vec![NotationCue::SetsReps {
                sets: 5,
                reps: "5".into()
            }]
        );
    }

    #[test]
    fn load_and_effort() {
        let cues = scan_notation("Deadlift 3x3 @ 80-85% then RPE 8");
        assert_eq!(
            cues,
            vec![
                NotationCue::SetsReps {
                    sets: 3,
                    reps: "3".into()
                },
                NotationCue::Percentage {
                    value: "80-85".into()
                },
                NotationCue::Rpe { value: "8".into() },
            ]
        );
    }

    #[test]
    fn superset_line_yields_rounds_and_rests() {
        let cues = scan_notation("A1: Pull-ups 0s / A2: Push-ups 90s, 4 Rounds");
        assert_eq!(
            cues,
            vec![
                NotationCue::TimeDomain { seconds: 0 },
                NotationCue::TimeDomain { seconds: 90 },
                NotationCue::Rounds { count: 4 },
            ]
        );
    }

    #[test]
    fn rft_shorthand_counts_rounds() {
        assert_eq!(
            scan_notation("5 RFT: 10 burpees"),
            vec![NotationCue::Rounds { count: 5 }]
        );
    }

    #[test]
    fn dash_sequences_classify_by_shape() {
        assert_eq!(
            scan_notation("21-15-9 thrusters"),
            vec![NotationCue::Ladder {
                steps: vec![21, 15, 9]
            }]
        );
        assert_eq!(
            scan_notation("1-2-3-2-1"),
            vec![NotationCue::Pyramid {
                steps: vec![1, 2, 3, 2, 1]
            }]
        );
        assert_eq!(
            scan_notation("curls 10-15"),
            vec![NotationCue::RepRange { low: 10, high: 15 }]
        );
    }

    #[test]
    fn plus_chains_and_clusters() {
        assert_eq!(
            scan_notation("curls 15+5+5"),
            vec![NotationCue::RestPause {
                segments: vec![15, 5, 5]
            }]
        );
        assert_eq!(
            scan_notation("clean complex 1+1+1"),
            vec![NotationCue::Complex {
                segments: vec![1, 1, 1]
            }]
        );
        assert_eq!(
            scan_notation("pulls 3.3.3"),
            vec![NotationCue::Cluster {
                segments: vec![3, 3, 3]
            }]
        );
    }

    #[test]
    fn time_domains_normalize_to_seconds() {
        assert_eq!(
            scan_notation("AMRAP 20 min"),
            vec![NotationCue::TimeDomain { seconds: 1200 }]
        );
        assert_eq!(
            scan_notation("row 1:30"),
            vec![NotationCue::TimeDomain { seconds: 90 }]
        );
    }

    #[test]
    fn plain_prose_has_no_cues() {
        assert!(scan_notation("chest today").is_empty());
    }

    #[test]
    fn cues_render_for_prompts() {
        let cue = NotationCue::Ladder {
            steps: vec![21, 15, 9],
        };
        assert_eq!(cue.to_string(), "ladder 21-15-9");
    }
}
