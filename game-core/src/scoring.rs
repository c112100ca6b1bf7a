/// Points for an accepted word.
///
/// Each letter is worth its Scrabble tile value and every letter past the
/// fourth earns one extra point. Characters that are not ASCII letters score
/// nothing.
pub fn word_score(word: &str) -> u32 {
    let letters: Vec<char> = word
        .chars()
        .map(|ch| ch.to_ascii_lowercase())
        .filter(|ch| ch.is_ascii_lowercase())
        .collect();

    let letter_points: u32 = letters.iter().map(|&ch| letter_value(ch)).sum();
    let length_bonus = letters.len().saturating_sub(4) as u32;

    letter_points + length_bonus
}

fn letter_value(letter: char) -> u32 {
    match letter {
        'a' | 'e' | 'i' | 'o' | 'u' | 'l' | 'n' | 's' | 't' | 'r' => 1,
        'd' | 'g' => 2,
        'b' | 'c' | 'm' | 'p' => 3,
        'f' | 'h' | 'v' | 'w' | 'y' => 4,
        'k' => 5,
        'j' | 'x' => 8,
        'q' | 'z' => 10,
        _ => 0,
    }
}
