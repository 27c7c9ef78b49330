/// Assert that a delegate lives at `specifier[index]` with the given generation
#[macro_export]
macro_rules! assert_delegate {
    ($client:expr, $specifier:expr, $index:expr, $generation:expr) => {
        let id = $client.with_state(|state| state.identifier($specifier, $index));
        assert_eq!(
            id,
            Some($crate::shared::Identifier::new($index, $generation)),
            "Expected delegate [{}, {}] in {}",
            $index,
            $generation,
            $specifier
        );
    };
}

/// Assert that no delegate lives at `specifier[index]`
#[macro_export]
macro_rules! assert_no_delegate {
    ($client:expr, $specifier:expr, $index:expr) => {
        assert!(
            !$client.with_state(|state| state.contains($specifier, $index)),
            "Expected no delegate at {}[{}]",
            $specifier,
            $index
        );
    };
}
