//! Random nickname generation for registrations that do not pick one.

use rand::seq::IndexedRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "clever", "jolly", "brave", "sly", "gentle", "swift", "calm", "bold", "lucky", "quiet",
];
const ANIMALS: &[&str] = &[
    "panda", "fox", "raccoon", "koala", "lion", "otter", "falcon", "badger", "lynx", "heron",
];

/// `adjective_animal_NNN`, always a valid nickname.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("otter");
    let number: u16 = rng.random_range(0..1000);
    format!("{}_{}_{}", adjective, animal, number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_nickname;

    #[test]
    fn test_generated_nicknames_are_valid() {
        for _ in 0..50 {
            let nickname = generate_nickname();
            assert!(validate_nickname(&nickname).is_ok(), "{nickname}");
            assert_eq!(nickname.split('_').count(), 3);
        }
    }
}
