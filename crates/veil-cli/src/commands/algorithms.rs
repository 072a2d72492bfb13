//! `veil algorithms`.

use veil_crypto::catalog::Primitive;

use crate::theme::Theme;

/// Print the supported names for every primitive.
pub(crate) fn list() {
    for primitive in Primitive::ALL {
        println!("{}", Theme::header(primitive.name()));
        for name in primitive.names() {
            println!("  {name}");
        }
        println!();
    }
}
