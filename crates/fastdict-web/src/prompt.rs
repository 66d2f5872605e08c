//! Instructions sent to the model for each lookup.

use fastdict_llm::Message;

const WORD_INSTRUCTION: &str = "\
Provide the Chinese translation and a brief definition. Keep it short and clear. \
For hard words in the definition, include their Chinese translation in brackets next to the word. \
Write each on two new lines.

Input: dictionary
Output:
字典

A dictionary is a reference book that lists words in alphabetical order (字母顺序) and provides their meanings, pronunciations, and other information.
";

const SENTENCE_INSTRUCTION: &str = "\
Translate the whole sentence into natural Chinese. Then briefly explain any hard words or idioms it uses, \
with their Chinese translation in brackets next to each. Keep it short and clear. \
Write each on two new lines.

Input: It's raining cats and dogs.
Output:
外面正下着倾盆大雨。

\"Raining cats and dogs\" is an idiom (习语) meaning it is raining very heavily (倾盆大雨).
";

/// Words beyond this count make a query a sentence
const MAX_PHRASE_WORDS: usize = 3;

const SENTENCE_TERMINATORS: &[char] = &['.', '?', '!', '。', '？', '！'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Word,
    Sentence,
}

impl LookupKind {
    pub fn classify(query: &str) -> Self {
        let query = query.trim();
        let words = query.split_whitespace().count();
        if words > MAX_PHRASE_WORDS || query.ends_with(SENTENCE_TERMINATORS) {
            LookupKind::Sentence
        } else {
            LookupKind::Word
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            LookupKind::Word => WORD_INSTRUCTION,
            LookupKind::Sentence => SENTENCE_INSTRUCTION,
        }
    }
}

pub fn build_messages(query: &str) -> Vec<Message> {
    let kind = LookupKind::classify(query);
    vec![
        Message::system(kind.instruction()),
        Message::human(format!("Look up: {}", query.trim())),
    ]
}
