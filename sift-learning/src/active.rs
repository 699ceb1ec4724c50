mod oracle;
pub use oracle::*;

mod hypothesis;
pub use hypothesis::*;

mod equivalence;
pub use equivalence::*;

mod learner;
pub use learner::*;

#[cfg(test)]
mod tests {
    use sift_core::{prelude::*, word::Word};

    use super::{
        separating_word, CountingOracle, DFAOracle, DfaLearner, ExhaustiveEquivalence, FnOracle,
        Hypothesis, MealyLearner, MealyOracle, MooreLearner, MooreOracle, ParallelOracle,
        RandomWordsEquivalence,
    };
    use crate::{error::LearningError, semantics::DfaSemantics};

    /// Accepts words where the number of 0s and the number of 1s are both even.
    fn even_even() -> DFA<CharAlphabet> {
        TSBuilder::with_state_colors([true, false, false, false])
            .with_transitions([
                (0, '0', Void, 1),
                (0, '1', Void, 2),
                (1, '0', Void, 0),
                (1, '1', Void, 3),
                (2, '0', Void, 3),
                (2, '1', Void, 0),
                (3, '0', Void, 2),
                (3, '1', Void, 1),
            ])
            .into_dfa(0)
    }

    #[test_log::test]
    fn dfa_even_even() {
        let target = even_even();
        let alphabet = target.alphabet().clone();
        let oracle = DFAOracle::new(target).unwrap();
        let mut learner = DfaLearner::new(alphabet, &oracle);

        learner.start_learning().unwrap();
        assert_eq!(learner.hypothesis().unwrap().size(), 1);

        assert!(learner.refine_hypothesis((Word::from("0"), false)).unwrap());
        assert_eq!(learner.hypothesis().unwrap().size(), 2);
        assert_eq!(learner.tree().inner_count(), 1);

        let hypothesis = learner.infer(&oracle).unwrap();
        assert_eq!(hypothesis.size(), 4);
        let dfa = hypothesis.to_dfa().unwrap();
        for word in ["", "00", "11", "0011"] {
            assert!(dfa.accepts(&Word::from(word)), "{word} should be accepted");
        }
        for word in ["0", "1", "01"] {
            assert!(!dfa.accepts(&Word::from(word)), "{word} should be rejected");
        }
        assert_eq!(hypothesis.output(&['1', '0', '0', '1']), Some(true));
        assert_eq!(hypothesis.accepts(&['1', '0']), Some(false));
        let run = hypothesis.run(&['0', '0']).unwrap();
        assert_eq!(run.len(), 3);
        assert_eq!(run[0], run[2]);
        assert_ne!(run[0], run[1]);
    }

    #[test_log::test]
    fn mealy_three_states() {
        let target: MealyMachine<CharAlphabet, u8> = TSBuilder::without_state_colors()
            .with_transitions([
                (0, 'a', 0, 0),
                (0, 'b', 1, 1),
                (0, 'c', 2, 2),
                (1, 'a', 0, 2),
                (1, 'b', 1, 1),
                (1, 'c', 2, 2),
                (2, 'a', 2, 2),
                (2, 'b', 0, 0),
                (2, 'c', 1, 2),
            ])
            .into_mealy(0);

        let alphabet = target.alphabet().clone();
        let oracle = MealyOracle::new(target.clone()).unwrap();
        let mut learner = MealyLearner::new(alphabet.clone(), &oracle);
        let hypothesis = learner.infer(&oracle).unwrap();
        let word = ['b', 'a', 'c', 'b', 'a'];
        assert_eq!(
            hypothesis.transduce(&word),
            target.transform(&word).map(Word::from)
        );
        let learned = hypothesis.to_mealy().unwrap();
        assert_eq!(learned.size(), 3);
        assert_eq!(separating_word(&target, &learned, &alphabet), None);
    }

    #[test_log::test]
    fn moore_counts_to_three() {
        let target = TSBuilder::with_state_colors([0u8, 0, 1])
            .with_transitions([
                (0, 'a', Void, 1),
                (0, 'b', Void, 0),
                (1, 'a', Void, 2),
                (1, 'b', Void, 1),
                (2, 'a', Void, 0),
                (2, 'b', Void, 2),
            ])
            .into_moore(0);

        let alphabet = target.alphabet().clone();
        let oracle = MooreOracle::new(target.clone()).unwrap();
        let mut learner = MooreLearner::new(alphabet.clone(), &oracle);
        learner.start_learning().unwrap();
        assert!(learner
            .refine_hypothesis((Word::from("aa"), Word::from(vec![0, 0, 1])))
            .unwrap());
        assert_eq!(learner.hypothesis().unwrap().size(), 3);

        let learned = learner.infer(&oracle).unwrap().to_moore().unwrap();
        assert_eq!(learned.size(), 3);
        assert_eq!(separating_word(&target, &learned, &alphabet), None);
    }

    #[test_log::test]
    fn learning_is_deterministic() {
        let run = || {
            let target = even_even();
            let alphabet = target.alphabet().clone();
            let counting = CountingOracle::new(DFAOracle::new(target).unwrap());
            let dfa = DfaLearner::new(alphabet, &counting)
                .infer(counting.inner())
                .unwrap()
                .to_dfa()
                .unwrap();
            (dfa, counting.queries(), counting.symbols())
        };
        assert_eq!(run(), run());
    }

    #[test_log::test]
    fn threaded_oracle_learns_the_same() {
        let target = even_even();
        let alphabet = target.alphabet().clone();
        let oracle = DFAOracle::new(target).unwrap();

        let sequential = DfaLearner::new(alphabet.clone(), &oracle)
            .infer(&oracle)
            .unwrap()
            .to_dfa()
            .unwrap();
        let parallel = DfaLearner::new(alphabet, ParallelOracle::new(&oracle))
            .infer(&oracle)
            .unwrap()
            .to_dfa()
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test_log::test]
    fn growing_alphabet() {
        // rejects every word that contains a 1
        let target = TSBuilder::with_state_colors([true, false])
            .with_transitions([
                (0, '0', Void, 0),
                (0, '1', Void, 1),
                (1, '0', Void, 1),
                (1, '1', Void, 1),
            ])
            .into_dfa(0);
        let oracle = DFAOracle::new(target).unwrap();
        let mut learner = DfaLearner::new(SimpleAlphabet::new(vec!['0']).unwrap(), &oracle);
        assert_eq!(learner.infer(&oracle).unwrap().size(), 1);

        learner.add_alphabet_symbol('1').unwrap();
        assert_eq!(learner.hypothesis().unwrap().size(), 1);
        let hypothesis = learner.infer(&oracle).unwrap();
        assert_eq!(hypothesis.size(), 2);
        assert_eq!(hypothesis.output(&['0', '1']), Some(false));
        assert_eq!(hypothesis.output(&['0', '0']), Some(true));
    }

    #[test_log::test]
    fn refinement_needs_a_started_learner_and_a_counterexample() {
        let target = even_even();
        let alphabet = target.alphabet().clone();
        let oracle = DFAOracle::new(target).unwrap();
        let mut learner = DfaLearner::new(alphabet, &oracle);
        assert!(matches!(learner.hypothesis(), Err(LearningError::NotStarted)));
        assert!(matches!(
            learner.refine_hypothesis((Word::from("0"), false)),
            Err(LearningError::NotStarted)
        ));

        learner.start_learning().unwrap();
        assert!(!learner.refine_hypothesis((Word::from("00"), true)).unwrap());
        assert_eq!(learner.rounds(), 0);
        assert!(learner.refine_hypothesis((Word::from("1"), false)).unwrap());
        assert_eq!(learner.rounds(), 1);
    }

    #[test_log::test]
    fn approximate_equivalence() {
        let oracle = FnOracle::new(|word: &[char]| word.iter().filter(|&&c| c == 'a').count() % 3 == 0);

        let exhaustive = ExhaustiveEquivalence::<_, DfaSemantics>::new(&oracle, 6);
        let mut learner = DfaLearner::new(CharAlphabet::of_size(2).unwrap(), &oracle);
        assert_eq!(learner.infer(&exhaustive).unwrap().size(), 3);

        let random = RandomWordsEquivalence::<_, DfaSemantics>::new(&oracle, 0, 10, 500, 3);
        let mut learner = DfaLearner::new(CharAlphabet::of_size(2).unwrap(), &oracle);
        let hypothesis = learner.infer(&random).unwrap();
        assert_eq!(hypothesis.size(), 3);
        assert_eq!(hypothesis.output(&['b', 'a', 'b', 'a', 'a']), Some(true));
    }
}
