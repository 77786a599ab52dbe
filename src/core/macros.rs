//! Macros for ergonomic state declaration.

/// Generate a state struct, its patch struct, and the `State` impl.
///
/// The patch struct carries one `Option` per field and derives
/// `Default`, so partial updates can name only the fields they touch.
///
/// # Example
///
/// ```
/// use patchbay::state_struct;
///
/// state_struct! {
///     pub struct GameState {
///         rand: u32,
///         tries: u32,
///     }
///     patch: GameStatePatch
/// }
///
/// use patchbay::core::State;
///
/// let mut state = GameState { rand: 4, tries: 0 };
/// state.apply(GameStatePatch {
///     tries: Some(1),
///     ..Default::default()
/// });
/// assert_eq!(state.rand, 4);
/// assert_eq!(state.tries, 1);
/// ```
#[macro_export]
macro_rules! state_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }

        patch: $patch:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty
            ),*
        }

        #[derive(Clone, Debug, Default)]
        $vis struct $patch {
            $(pub $field: Option<$ty>),*
        }

        impl $crate::core::State for $name {
            type Patch = $patch;

            fn apply(&mut self, patch: Self::Patch) {
                $(
                    if let Some(value) = patch.$field {
                        self.$field = value;
                    }
                )*
            }
        }
    };
}
