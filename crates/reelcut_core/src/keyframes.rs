use crate::types::*;

/// Apply an easing curve to a progress value in `[0, 1]`.
pub fn ease(easing: Easing, t: f64) -> f64 {
    match easing {
        Easing::Linear => t,
        Easing::EaseIn => t * t,
        Easing::EaseOut => t * (2.0 - t),
        Easing::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
    }
}

/// Evaluate a property's keyframe sequence at a point in time.
///
/// Empty sequence yields `None`. A single keyframe holds its value
/// everywhere. Queries before the first or after the last keyframe hold the
/// boundary value; a query exactly on a keyframe returns that value with no
/// interpolation error. Between keyframes, numbers blend linearly under the
/// left keyframe's easing, points blend component-wise, and text holds the
/// left value (step function).
pub fn interpolate(keyframes: &[Keyframe], time_us: TimeUs) -> Option<KeyframeValue> {
    match keyframes {
        [] => return None,
        [only] => return Some(only.value.clone()),
        _ => {}
    }

    let first = keyframes.first()?;
    let last = keyframes.last()?;
    if time_us <= first.time_us {
        return Some(first.value.clone());
    }
    if time_us >= last.time_us {
        return Some(last.value.clone());
    }

    // The latest keyframe at or before the query, and the one after it.
    let next_idx = keyframes.iter().position(|k| k.time_us > time_us)?;
    let prev = &keyframes[next_idx - 1];
    let next = &keyframes[next_idx];

    if time_us == prev.time_us {
        return Some(prev.value.clone());
    }

    let span = (next.time_us - prev.time_us).as_seconds();
    let progress = (time_us - prev.time_us).as_seconds() / span;
    let eased = ease(prev.easing, progress);

    let value = match (&prev.value, &next.value) {
        (KeyframeValue::Number(a), KeyframeValue::Number(b)) => {
            KeyframeValue::Number(a + (b - a) * eased)
        }
        (KeyframeValue::Point { x: ax, y: ay }, KeyframeValue::Point { x: bx, y: by }) => {
            KeyframeValue::Point {
                x: ax + (bx - ax) * eased,
                y: ay + (by - ay) * eased,
            }
        }
        // Discrete or mismatched values cannot blend: hold the left value.
        _ => prev.value.clone(),
    };
    Some(value)
}

/// Insert a keyframe keeping the sequence time-ordered. A keyframe already at
/// exactly `time_us` is replaced, never duplicated.
pub fn add_keyframe(
    keyframes: &mut Vec<Keyframe>,
    time_us: TimeUs,
    value: KeyframeValue,
    easing: Easing,
) {
    let keyframe = Keyframe {
        time_us,
        value,
        easing,
    };
    match keyframes.binary_search_by_key(&time_us, |k| k.time_us) {
        Ok(idx) => keyframes[idx] = keyframe,
        Err(idx) => keyframes.insert(idx, keyframe),
    }
}

/// Remove the keyframe at exactly `time_us`, if present.
pub fn remove_keyframe(keyframes: &mut Vec<Keyframe>, time_us: TimeUs) {
    keyframes.retain(|k| k.time_us != time_us);
}

impl Clip {
    /// Set a keyframe on a named property, creating the sequence on first use.
    pub fn set_keyframe(
        &mut self,
        property: &str,
        time_us: TimeUs,
        value: KeyframeValue,
        easing: Easing,
    ) {
        let list = self.keyframes.entry(property.to_string()).or_default();
        add_keyframe(list, time_us, value, easing);
    }

    /// Remove a property keyframe at exactly `time_us`; drops the sequence
    /// when it becomes empty.
    pub fn remove_keyframe(&mut self, property: &str, time_us: TimeUs) {
        if let Some(list) = self.keyframes.get_mut(property) {
            remove_keyframe(list, time_us);
            if list.is_empty() {
                self.keyframes.remove(property);
            }
        }
    }

    /// Evaluate an animated property at a point in time.
    pub fn value_at(&self, property: &str, time_us: TimeUs) -> Option<KeyframeValue> {
        interpolate(self.keyframes.get(property)?, time_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_kfs(samples: &[(i64, f64, Easing)]) -> Vec<Keyframe> {
        samples
            .iter()
            .map(|&(t, v, e)| Keyframe {
                time_us: TimeUs(t),
                value: KeyframeValue::Number(v),
                easing: e,
            })
            .collect()
    }

    fn number_at(kfs: &[Keyframe], t: i64) -> f64 {
        match interpolate(kfs, TimeUs(t)) {
            Some(KeyframeValue::Number(n)) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn empty_sequence_yields_none() {
        assert_eq!(interpolate(&[], TimeUs(0)), None);
    }

    #[test]
    fn single_keyframe_holds_everywhere() {
        let kfs = number_kfs(&[(1_000_000, 0.5, Easing::Linear)]);
        for t in [-1_000_000, 0, 1_000_000, 9_000_000] {
            assert_eq!(number_at(&kfs, t), 0.5);
        }
    }

    #[test]
    fn boundary_hold_before_first_and_after_last() {
        let kfs = number_kfs(&[
            (1_000_000, 10.0, Easing::Linear),
            (3_000_000, 30.0, Easing::Linear),
        ]);
        assert_eq!(number_at(&kfs, 0), 10.0);
        assert_eq!(number_at(&kfs, 1_000_000), 10.0);
        assert_eq!(number_at(&kfs, 3_000_000), 30.0);
        assert_eq!(number_at(&kfs, 9_000_000), 30.0);
    }

    #[test]
    fn exact_keyframe_time_returns_exact_value() {
        let kfs = number_kfs(&[
            (0, 0.1, Easing::EaseInOut),
            (1_000_000, 0.7, Easing::EaseInOut),
            (2_000_000, 0.3, Easing::EaseInOut),
        ]);
        assert_eq!(number_at(&kfs, 1_000_000), 0.7);
    }

    #[test]
    fn linear_midpoint() {
        let kfs = number_kfs(&[(0, 0.0, Easing::Linear), (2_000_000, 10.0, Easing::Linear)]);
        assert!((number_at(&kfs, 1_000_000) - 5.0).abs() < 1e-9);
        assert!((number_at(&kfs, 500_000) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn ease_curves_at_quarter_points() {
        assert_eq!(ease(Easing::Linear, 0.5), 0.5);
        assert!((ease(Easing::EaseIn, 0.5) - 0.25).abs() < 1e-12);
        assert!((ease(Easing::EaseOut, 0.5) - 0.75).abs() < 1e-12);
        assert!((ease(Easing::EaseInOut, 0.25) - 0.125).abs() < 1e-12);
        assert!((ease(Easing::EaseInOut, 0.75) - 0.875).abs() < 1e-12);
        // All curves are pinned at the interval ends.
        for e in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(ease(e, 0.0), 0.0);
            assert_eq!(ease(e, 1.0), 1.0);
        }
    }

    #[test]
    fn ease_in_shapes_the_segment() {
        let kfs = number_kfs(&[(0, 0.0, Easing::EaseIn), (2_000_000, 10.0, Easing::EaseIn)]);
        // progress 0.5 eased to 0.25.
        assert!((number_at(&kfs, 1_000_000) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn point_values_blend_component_wise() {
        let kfs = vec![
            Keyframe {
                time_us: TimeUs(0),
                value: KeyframeValue::Point { x: 0.0, y: 100.0 },
                easing: Easing::Linear,
            },
            Keyframe {
                time_us: TimeUs(2_000_000),
                value: KeyframeValue::Point { x: 10.0, y: 0.0 },
                easing: Easing::Linear,
            },
        ];
        match interpolate(&kfs, TimeUs(1_000_000)).unwrap() {
            KeyframeValue::Point { x, y } => {
                assert!((x - 5.0).abs() < 1e-9);
                assert!((y - 50.0).abs() < 1e-9);
            }
            other => panic!("expected point, got {other:?}"),
        }
    }

    #[test]
    fn text_values_hold_as_step_function() {
        let kfs = vec![
            Keyframe {
                time_us: TimeUs(0),
                value: KeyframeValue::Text("left".into()),
                easing: Easing::Linear,
            },
            Keyframe {
                time_us: TimeUs(2_000_000),
                value: KeyframeValue::Text("right".into()),
                easing: Easing::Linear,
            },
        ];
        assert_eq!(
            interpolate(&kfs, TimeUs(1_999_999)).unwrap(),
            KeyframeValue::Text("left".into())
        );
        assert_eq!(
            interpolate(&kfs, TimeUs(2_000_000)).unwrap(),
            KeyframeValue::Text("right".into())
        );
    }

    #[test]
    fn add_keyframe_keeps_order_and_replaces_duplicates() {
        let mut kfs = vec![];
        add_keyframe(
            &mut kfs,
            TimeUs(2_000_000),
            KeyframeValue::Number(2.0),
            Easing::Linear,
        );
        add_keyframe(
            &mut kfs,
            TimeUs(0),
            KeyframeValue::Number(0.0),
            Easing::Linear,
        );
        add_keyframe(
            &mut kfs,
            TimeUs(1_000_000),
            KeyframeValue::Number(1.0),
            Easing::Linear,
        );
        let times: Vec<i64> = kfs.iter().map(|k| k.time_us.0).collect();
        assert_eq!(times, vec![0, 1_000_000, 2_000_000]);

        // Same time replaces, never duplicates.
        add_keyframe(
            &mut kfs,
            TimeUs(1_000_000),
            KeyframeValue::Number(9.0),
            Easing::EaseOut,
        );
        assert_eq!(kfs.len(), 3);
        assert_eq!(kfs[1].value, KeyframeValue::Number(9.0));
        assert_eq!(kfs[1].easing, Easing::EaseOut);
    }

    #[test]
    fn remove_keyframe_exact_time_only() {
        let mut kfs = number_kfs(&[(0, 0.0, Easing::Linear), (1_000_000, 1.0, Easing::Linear)]);
        remove_keyframe(&mut kfs, TimeUs(500_000));
        assert_eq!(kfs.len(), 2);
        remove_keyframe(&mut kfs, TimeUs(1_000_000));
        assert_eq!(kfs.len(), 1);
    }

    #[test]
    fn clip_property_animation_roundtrip() {
        let mut clip = Clip::new(
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            TimeUs(0),
            TimeUs(5_000_000),
        );
        clip.set_keyframe(
            "opacity",
            TimeUs(0),
            KeyframeValue::Number(0.0),
            Easing::Linear,
        );
        clip.set_keyframe(
            "opacity",
            TimeUs(2_000_000),
            KeyframeValue::Number(1.0),
            Easing::Linear,
        );

        match clip.value_at("opacity", TimeUs(1_000_000)).unwrap() {
            KeyframeValue::Number(n) => assert!((n - 0.5).abs() < 1e-9),
            other => panic!("expected number, got {other:?}"),
        }
        assert_eq!(clip.value_at("scale", TimeUs(0)), None);

        clip.remove_keyframe("opacity", TimeUs(0));
        clip.remove_keyframe("opacity", TimeUs(2_000_000));
        assert!(!clip.keyframes.contains_key("opacity"));
    }
}
