//! # Vote Aggregator
//! Pure logic mapping classified signals → one light class.
//!
//! Policy: majority wins; a perfect tie goes to the image signal unless the
//! image is ambiguous (`Faible`), otherwise to `Moyen`. An extreme verdict
//! (`Lumineux` / `Sombre`) then needs at least [`MIN_CORROBORATING_VOTES`]
//! signals that individually voted for it, or it collapses to `Moyen`.
//! A lone signal of any kind, including a lone image reading, can therefore
//! never claim an extreme class.

use serde::{Deserialize, Serialize};

use crate::signal::{ClassifiedSignal, ImageIntensity, SignalClass, SignalKind};

/// Agreeing signals required before committing to `Lumineux` or `Sombre`.
pub const MIN_CORROBORATING_VOTES: usize = 2;

/// How the vote resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteResolution {
    NoSignal,
    Majority,
    TieToImage,
    TieToMoyen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub class: SignalClass,
    pub resolution: VoteResolution,
    /// Class the vote produced before the corroboration guard, if it was demoted.
    pub demoted_from: Option<SignalClass>,
}

/// Votes per class, in `SignalClass::ALL` order.
pub fn tally(signals: &[ClassifiedSignal]) -> [usize; 3] {
    let mut counts = [0usize; 3];
    for s in signals {
        counts[index(s.class)] += 1;
    }
    counts
}

pub fn votes_for(signals: &[ClassifiedSignal], class: SignalClass) -> usize {
    signals.iter().filter(|s| s.class == class).count()
}

/// Combine `signals` into one class. `image_intensity` describes the image
/// signal when one is present among `signals`.
pub fn aggregate(signals: &[ClassifiedSignal], image_intensity: Option<ImageIntensity>) -> VoteOutcome {
    if signals.is_empty() {
        return VoteOutcome {
            class: SignalClass::Moyen,
            resolution: VoteResolution::NoSignal,
            demoted_from: None,
        };
    }

    let counts = tally(signals);
    let top = counts.iter().copied().max().unwrap_or(0);
    let leaders: Vec<SignalClass> = SignalClass::ALL
        .iter()
        .copied()
        .filter(|c| counts[index(*c)] == top)
        .collect();

    let (voted, resolution) = if let [single] = leaders.as_slice() {
        (*single, VoteResolution::Majority)
    } else {
        let image = signals.iter().find(|s| s.kind == SignalKind::Image);
        match (image, image_intensity) {
            (Some(_), Some(ImageIntensity::Faible)) => (SignalClass::Moyen, VoteResolution::TieToMoyen),
            (Some(img), _) => (img.class, VoteResolution::TieToImage),
            (None, _) => (SignalClass::Moyen, VoteResolution::TieToMoyen),
        }
    };

    if voted.is_extreme() && votes_for(signals, voted) < MIN_CORROBORATING_VOTES {
        return VoteOutcome {
            class: SignalClass::Moyen,
            resolution,
            demoted_from: Some(voted),
        };
    }

    VoteOutcome {
        class: voted,
        resolution,
        demoted_from: None,
    }
}

fn index(class: SignalClass) -> usize {
    match class {
        SignalClass::Lumineux => 0,
        SignalClass::Moyen => 1,
        SignalClass::Sombre => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SignalClass::*;
    use SignalKind::*;

    fn sig(kind: SignalKind, class: SignalClass) -> ClassifiedSignal {
        ClassifiedSignal::new(kind, class)
    }

    #[test]
    fn no_signal_is_moyen() {
        let v = aggregate(&[], None);
        assert_eq!(v.class, Moyen);
        assert_eq!(v.resolution, VoteResolution::NoSignal);
    }

    #[test]
    fn lone_signals_never_claim_extremes() {
        let v = aggregate(&[sig(Image, Lumineux)], Some(ImageIntensity::Fort));
        assert_eq!(v.class, Moyen);
        assert_eq!(v.demoted_from, Some(Lumineux));

        let v = aggregate(&[sig(Orientation, Sombre)], None);
        assert_eq!(v.class, Moyen);
    }

    #[test]
    fn two_agreeing_signals_commit() {
        let v = aggregate(&[sig(Floor, Lumineux), sig(Orientation, Lumineux)], None);
        assert_eq!(v.class, Lumineux);
        assert_eq!(v.resolution, VoteResolution::Majority);
        assert!(v.demoted_from.is_none());
    }

    #[test]
    fn majority_of_three() {
        let v = aggregate(
            &[sig(Orientation, Sombre), sig(Floor, Sombre), sig(Image, Lumineux)],
            Some(ImageIntensity::Fort),
        );
        assert_eq!(v.class, Sombre);
    }

    #[test]
    fn tie_goes_to_image_then_guard_demotes() {
        let v = aggregate(
            &[sig(Orientation, Sombre), sig(Image, Lumineux)],
            Some(ImageIntensity::Normal),
        );
        assert_eq!(v.resolution, VoteResolution::TieToImage);
        assert_eq!(v.class, Moyen);
        assert_eq!(v.demoted_from, Some(Lumineux));
    }

    #[test]
    fn tie_with_image_moyen_keeps_moyen() {
        let v = aggregate(
            &[sig(Orientation, Lumineux), sig(Image, Moyen)],
            Some(ImageIntensity::Normal),
        );
        assert_eq!(v.class, Moyen);
        assert_eq!(v.resolution, VoteResolution::TieToImage);
        assert!(v.demoted_from.is_none());
    }

    #[test]
    fn tie_with_weak_image_or_without_image_is_moyen() {
        let weak = aggregate(
            &[sig(Orientation, Sombre), sig(Image, Moyen)],
            Some(ImageIntensity::Faible),
        );
        assert_eq!(weak.resolution, VoteResolution::TieToMoyen);
        assert_eq!(weak.class, Moyen);

        let no_image = aggregate(&[sig(Orientation, Lumineux), sig(Floor, Sombre)], None);
        assert_eq!(no_image.resolution, VoteResolution::TieToMoyen);
        assert_eq!(no_image.class, Moyen);
    }

    #[test]
    fn extremes_always_have_two_votes() {
        let classes = [Lumineux, Moyen, Sombre];
        let kinds = [Orientation, Floor, Image];
        for a in classes {
            for b in classes {
                for c in classes {
                    for n in 0..=3 {
                        let all = [sig(kinds[0], a), sig(kinds[1], b), sig(kinds[2], c)];
                        let set = &all[..n];
                        for intensity in [ImageIntensity::Fort, ImageIntensity::Faible, ImageIntensity::Normal] {
                            let v = aggregate(set, Some(intensity));
                            if v.class.is_extreme() {
                                assert!(votes_for(set, v.class) >= MIN_CORROBORATING_VOTES, "{set:?}");
                            }
                        }
                    }
                }
            }
        }
    }
}
