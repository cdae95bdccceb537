/// Tests for the per-method pass schedules
///
/// Tests verify:
/// - Pass counts per method (1 / 3 / 7)
/// - Exact DESTROY order
/// - 1-based, contiguous pass indices
/// - Method name parsing

#[cfg(test)]
mod schedule_tests {
    use crate::algorithms::{schedule_for, Pattern, WipeMethod};
    use crate::error::WipeError;
    use test_case::test_case;

    #[test_case(WipeMethod::Clear, 1 ; "clear is single pass")]
    #[test_case(WipeMethod::Purge, 3 ; "purge is three passes")]
    #[test_case(WipeMethod::Destroy, 7 ; "destroy is seven passes")]
    fn test_pass_counts(method: WipeMethod, expected: usize) {
        let schedule = schedule_for(method);
        assert_eq!(schedule.len(), expected);
        assert!(schedule.iter().all(|p| p.total == expected));
    }

    #[test]
    fn test_destroy_order_is_exact() {
        let patterns: Vec<Pattern> = schedule_for(WipeMethod::Destroy)
            .into_iter()
            .map(|p| p.pattern)
            .collect();

        assert_eq!(
            patterns,
            vec![
                Pattern::Zero,
                Pattern::Ones,
                Pattern::Zero,
                Pattern::AltAA,
                Pattern::Alt55,
                Pattern::AltAA,
                Pattern::Random,
            ]
        );
    }

    #[test]
    fn test_purge_order() {
        let patterns: Vec<Pattern> = schedule_for(WipeMethod::Purge)
            .into_iter()
            .map(|p| p.pattern)
            .collect();
        assert_eq!(patterns, vec![Pattern::Zero, Pattern::Ones, Pattern::Random]);
    }

    #[test]
    fn test_indices_are_one_based_and_contiguous() {
        for method in WipeMethod::ALL {
            let schedule = schedule_for(method);
            for (i, pass) in schedule.iter().enumerate() {
                assert_eq!(pass.index, i + 1);
            }
            assert!(schedule.last().unwrap().is_final());
            assert_eq!(schedule.iter().filter(|p| p.is_final()).count(), 1);
        }
    }

    #[test]
    fn test_schedule_is_stable() {
        for method in WipeMethod::ALL {
            assert_eq!(schedule_for(method), schedule_for(method));
        }
    }

    #[test_case("--clear", WipeMethod::Clear ; "clear flag")]
    #[test_case("--purge", WipeMethod::Purge ; "purge flag")]
    #[test_case("--destroy-sw", WipeMethod::Destroy ; "destroy flag")]
    #[test_case("clear", WipeMethod::Clear ; "bare clear")]
    #[test_case("destroy", WipeMethod::Destroy ; "bare destroy")]
    fn test_method_parsing(input: &str, expected: WipeMethod) {
        assert_eq!(input.parse::<WipeMethod>().unwrap(), expected);
    }

    #[test_case("--turbo" ; "turbo")]
    #[test_case("--gutmann" ; "gutmann")]
    #[test_case("" ; "empty")]
    fn test_unknown_method_rejected(input: &str) {
        match input.parse::<WipeMethod>() {
            Err(WipeError::UnsupportedMethod(name)) => assert_eq!(name, input),
            other => panic!("expected UnsupportedMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_method_flag_round_trips() {
        for method in WipeMethod::ALL {
            assert_eq!(method.flag().parse::<WipeMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_pattern_fill_bytes() {
        assert_eq!(Pattern::Zero.fill_byte(), Some(0x00));
        assert_eq!(Pattern::Ones.fill_byte(), Some(0xFF));
        assert_eq!(Pattern::AltAA.fill_byte(), Some(0xAA));
        assert_eq!(Pattern::Alt55.fill_byte(), Some(0x55));
        assert_eq!(Pattern::Random.fill_byte(), None);
        assert_eq!(Pattern::AltAA.to_string(), "0xAA");
    }
}
