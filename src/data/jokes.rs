use chrono::{Datelike, NaiveDate};

/// Jokes served when the joke provider is disabled or unreachable.
pub const LOCAL_JOKES: &[&str] = &[
    "I told my wife she should embrace her mistakes. She gave me a hug.",
    "Why don't skeletons fight each other? They don't have the guts.",
    "I'm reading a book about anti-gravity. It's impossible to put down.",
    "Why did the scarecrow win an award? He was outstanding in his field.",
    "I used to play piano by ear, now I use my hands.",
    "I asked my dog what's two minus two. He said nothing.",
];

/// The local joke for `date`; stable within a day, rotating across days.
pub fn local_joke(date: NaiveDate) -> &'static str {
    LOCAL_JOKES[date.ordinal0() as usize % LOCAL_JOKES.len()]
}
