/// Implements the `std::ops` traits for single-field newtypes by delegating to the wrapped value.
///
/// * `binary`: `Newtype op Newtype -> Newtype`
/// * `inplace`: `Newtype op= Newtype`
/// * `scalar`: `Newtype op $rhs -> Newtype`, e.g. a unit price times a quantity
#[macro_export]
macro_rules! op {
    (binary $newtype:ident, $trait_name:ident, $method:ident) => {
        impl $trait_name for $newtype {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                Self(self.0.$method(rhs.0))
            }
        }
    };

    (inplace $newtype:ident, $trait_name:ident, $method:ident) => {
        impl $trait_name for $newtype {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0);
            }
        }
    };

    (scalar $newtype:ident, $rhs:ty, $trait_name:ident, $method:ident) => {
        impl $trait_name<$rhs> for $newtype {
            type Output = Self;

            fn $method(self, rhs: $rhs) -> Self {
                Self(self.0.$method(rhs))
            }
        }
    };
}
