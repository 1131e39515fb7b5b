//! Reborn in a New World
//!
//! The story is a fixed chain of steps. Each step takes the current
//! [`GameState`] by value and returns an [`Outcome`] carrying the updated
//! state; `Win` and `Lose` stop the chain.
//!
//! Story code only sees an [`OutputSink`] and a [`LineSource`], so it runs
//! the same against the UI bridge or a scripted test double.

use anyhow::{bail, Result};

use crate::core::bridge::OutputSink;
use crate::core::prompt::LineSource;

const BOLD_YELLOW: &str = "\x1b[1;33m";
const BOLD_CYAN: &str = "\x1b[1;36m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_MAGENTA: &str = "\x1b[1;35m";
const RESET: &str = "\x1b[0m";

const DEFAULT_NAME: &str = "Nameless One";

/// Life skill picked at the start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skill {
    Magic,
    Sword,
}

impl Skill {
    pub fn as_str(self) -> &'static str {
        match self {
            Skill::Magic => "magic",
            Skill::Sword => "sword",
        }
    }

    fn class_name(self) -> &'static str {
        match self {
            Skill::Magic => "Magician",
            Skill::Sword => "Warrior",
        }
    }
}

/// Everything the story remembers between steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub score: i32,
    pub name: String,
    pub skill: Option<Skill>,
}

impl GameState {
    fn add_points(mut self, points: i32) -> Self {
        self.score += points;
        self
    }
}

/// Result of one story step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<S> {
    Continue(S),
    Win(S),
    Lose(S),
}

/// How a finished story ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ending {
    pub won: bool,
    pub score: i32,
}

type Step = Result<Outcome<GameState>>;

/// Play the story from the beginning
pub fn run<O, I>(out: &O, input: &mut I) -> Result<Ending>
where
    O: OutputSink + ?Sized,
    I: LineSource + ?Sized,
{
    Story { out, input }.play()
}

struct Story<'a, O: ?Sized, I: ?Sized> {
    out: &'a O,
    input: &'a mut I,
}

impl<'a, O, I> Story<'a, O, I>
where
    O: OutputSink + ?Sized,
    I: LineSource + ?Sized,
{
    fn play(&mut self) -> Result<Ending> {
        let steps: [fn(&mut Self, GameState) -> Step; 7] = [
            Self::title,
            Self::awakening,
            Self::naming,
            Self::skill,
            Self::departure,
            Self::crossroads,
            Self::forest,
        ];

        let mut state = GameState::default();
        for step in steps {
            state = match step(self, state)? {
                Outcome::Continue(next) => next,
                Outcome::Win(end) => return Ok(Ending { won: true, score: end.score }),
                Outcome::Lose(end) => return Ok(Ending { won: false, score: end.score }),
            };
        }

        bail!("story ran out of steps without an ending")
    }

    // ---- Output helpers ----------------------------------------------------

    fn say(&self, text: &str) {
        self.out.write(&format!("{text}\n"));
    }

    fn blank(&self) {
        self.out.write("\n");
    }

    fn styled(&self, style: &str, text: &str) {
        self.out.write(&format!("{style}{text}{RESET}\n"));
    }

    fn show_score(&self, state: &GameState) {
        self.styled(BOLD_YELLOW, &format!("\t[Current Score: {}]", state.score));
        self.styled(BOLD_CYAN, "");
    }

    fn final_score(&self, state: &GameState) {
        self.styled(
            BOLD_YELLOW,
            &format!("\n    Your final score: \n\t{} points", state.score),
        );
        self.styled(BOLD_RED, "\n\tGame Over!!!");
    }

    // ---- Input helpers -----------------------------------------------------

    fn continue_to_next(&mut self) -> Result<()> {
        self.blank();
        self.input
            .read_line(&format!("{BOLD_CYAN}\t<--- Tap Enter to Continue --->{RESET}"))?;
        self.blank();
        Ok(())
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.input.read_line(question)?;
            match answer.trim().to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => self.say("Please enter 'y' or 'n'."),
            }
        }
    }

    /// Index into `options` of the answer, matched case-insensitively
    fn ask_option(&mut self, question: &str, options: &[&str]) -> Result<usize> {
        loop {
            let answer = self.input.read_line(question)?.trim().to_lowercase();
            if let Some(index) = options.iter().position(|o| o.to_lowercase() == answer) {
                return Ok(index);
            }
            self.say(&format!("Please choose one of: {}", options.join(", ")));
        }
    }

    // ---- Endings -----------------------------------------------------------

    fn bad_end(&self, state: GameState) -> Outcome<GameState> {
        self.blank();
        self.say(
            "Your choice had led you to a beast much greater than your skill, \
             you could not win... Goodbye",
        );
        self.styled(BOLD_RED, "\n\tYOU LOSE!!!");
        self.final_score(&state);
        Outcome::Lose(state)
    }

    fn stayed_home(&self, state: GameState) -> Outcome<GameState> {
        self.blank();
        self.say(
            "You chose not to adventure to a new land. Your home was crushed by \
             an asteroid. You failed to survive!",
        );
        self.styled(BOLD_RED, "\n\tYOU LOSE!!!");
        self.final_score(&state);
        Outcome::Lose(state)
    }

    fn survived(&self, state: GameState) -> Outcome<GameState> {
        self.blank();
        self.say("You have managed to survive in this new world. Enjoy your new Home!");
        self.styled(BOLD_RED, "\n\tYOU WIN!!!");
        self.final_score(&state);
        Outcome::Win(state)
    }

    // ---- Steps -------------------------------------------------------------

    fn title(&mut self, state: GameState) -> Step {
        self.styled(BOLD_MAGENTA, "█▓▒░░ Welcome to: Reborn in a New World ░░▒▓█");
        self.continue_to_next()?;
        Ok(Outcome::Continue(state))
    }

    fn awakening(&mut self, state: GameState) -> Step {
        self.say(
            "The world fades to black and suddenly a bright light appears. \
             Your eyes open and you awaken to a new world.",
        );
        self.say(
            "You have been Reborn! You are now in a world called Faefolk, a world \
             of magic and must survive. You have some choices to make before you can start.",
        );
        self.continue_to_next()?;
        self.show_score(&state);
        Ok(Outcome::Continue(state))
    }

    fn naming(&mut self, mut state: GameState) -> Step {
        if !self.ask_yes_no("Do you want to pick a name? (y/n): ")? {
            self.say(" You ignored the naming process, a storm starts to brew outside...");
            self.blank();
            return Ok(self.stayed_home(state));
        }

        self.blank();
        self.say("You have chosen to select a name!");
        let name = self.input.read_line("What shall your name be? : ")?;
        state.name = match name.trim() {
            "" => DEFAULT_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.blank();
        self.say(&format!("Welcome to Faefolk world of magic {}!", state.name));
        self.continue_to_next()?;

        let state = state.add_points(10);
        self.show_score(&state);
        Ok(Outcome::Continue(state))
    }

    fn skill(&mut self, mut state: GameState) -> Step {
        let skill = match self.ask_option(
            "Now you must choose your life skill.(Magic or Sword): ",
            &["Magic", "Sword"],
        )? {
            0 => Skill::Magic,
            _ => Skill::Sword,
        };
        state.skill = Some(skill);

        self.blank();
        self.say(&format!("You have chosen the {} class", skill.class_name()));
        self.continue_to_next()?;

        let state = state.add_points(20);
        self.show_score(&state);
        Ok(Outcome::Continue(state))
    }

    fn departure(&mut self, state: GameState) -> Step {
        let skill = state.skill.map(Skill::as_str).unwrap_or("unknown");
        self.say(&format!(
            "Now that you have chosen the name {} and the {} class, it is time to \
             set off on your Adventure to explore the world",
            state.name, skill
        ));
        self.continue_to_next()?;
        self.show_score(&state);
        Ok(Outcome::Continue(state))
    }

    fn crossroads(&mut self, state: GameState) -> Step {
        self.blank();
        self.say(
            "You leave the house you were reborn into, there is a fork in the road \
             going East and West.",
        );
        self.blank();

        match self.ask_option("Will you travel East or West or Home?: ", &["East", "West", "Home"])? {
            0 => {
                self.say("You have chosen to go East to the Forest.");
                self.continue_to_next()?;
                let state = state.add_points(50);
                self.show_score(&state);
                Ok(Outcome::Continue(state))
            }
            1 => {
                self.say("You have chosen to go west into the dark cave");
                self.blank();
                let state = state.add_points(-500);
                self.show_score(&state);
                Ok(self.bad_end(state))
            }
            _ => {
                self.blank();
                let state = state.add_points(-1000);
                self.show_score(&state);
                Ok(self.stayed_home(state))
            }
        }
    }

    fn forest(&mut self, state: GameState) -> Step {
        self.say(" You have made it to the forest where a small monster appears");

        if !self.ask_yes_no("Do you stay and fight? (y/n): ")? {
            self.say("You fled and ended up in the dark cave...");
            let state = state.add_points(-500);
            self.show_score(&state);
            return Ok(self.bad_end(state));
        }

        self.blank();
        let state = match state.skill {
            Some(Skill::Magic) => {
                self.say(
                    "You have chosen to stay and fight! You use your magic and shoot a fireball",
                );
                let state = state.add_points(200);
                self.show_score(&state);
                self.continue_to_next()?;
                state
            }
            _ => {
                self.say(
                    "You have chosen to stay and fight! You use your sword and lunge \
                     with a big swing of your sword",
                );
                self.continue_to_next()?;
                let state = state.add_points(200);
                self.show_score(&state);
                state
            }
        };

        self.say(
            "You have made a direct hit and the monster is dead. You escape the forest \
             and make it to the Village",
        );
        self.continue_to_next()?;
        Ok(self.survived(state.add_points(1000)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::PromptError;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Transcript(RefCell<String>);

    impl OutputSink for Transcript {
        fn write(&self, chunk: &str) {
            self.0.borrow_mut().push_str(chunk);
        }
    }

    impl Transcript {
        fn text(&self) -> String {
            self.0.borrow().clone()
        }
    }

    /// Answers "continue" prompts automatically and everything else from a script
    struct Script {
        answers: VecDeque<&'static str>,
        prompts: Vec<String>,
    }

    impl Script {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                prompts: Vec::new(),
            }
        }
    }

    impl LineSource for Script {
        fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
            self.prompts.push(prompt.to_string());
            if prompt.contains("Tap Enter to Continue") {
                return Ok(String::new());
            }
            self.answers
                .pop_front()
                .map(str::to_string)
                .ok_or(PromptError::Closed)
        }
    }

    fn play(answers: &[&'static str]) -> (Result<Ending>, String, Script) {
        let out = Transcript::default();
        let mut script = Script::new(answers);
        let ending = run(&out, &mut script);
        (ending, out.text(), script)
    }

    #[test]
    fn test_magic_win() {
        let (ending, text, script) = play(&["y", "Ari", "magic", "east", "y"]);

        assert_eq!(ending.unwrap(), Ending { won: true, score: 1280 });
        assert!(text.contains("Welcome to Faefolk world of magic Ari!"));
        assert!(text.contains("shoot a fireball"));
        assert!(text.contains("\x1b[1;31m\n\tYOU WIN!!!\x1b[0m"));
        assert!(text.contains("\n\t1280 points"));
        assert!(script.answers.is_empty());
    }

    #[test]
    fn test_sword_win() {
        let (ending, text, _) = play(&["y", "Kai", "SWORD", "East", "Y"]);

        assert_eq!(ending.unwrap(), Ending { won: true, score: 1280 });
        assert!(text.contains("You have chosen the Warrior class"));
        assert!(text.contains("big swing of your sword"));
        assert!(text.contains("the name Kai and the sword class"));
    }

    #[test]
    fn test_refusing_a_name_loses() {
        let (ending, text, _) = play(&["n"]);

        assert_eq!(ending.unwrap(), Ending { won: false, score: 0 });
        assert!(text.contains("a storm starts to brew outside"));
        assert!(text.contains("YOU LOSE!!!"));
    }

    #[test]
    fn test_west_cave_loses() {
        let (ending, text, _) = play(&["y", "Ari", "magic", "west"]);

        assert_eq!(ending.unwrap(), Ending { won: false, score: -470 });
        assert!(text.contains("beast much greater than your skill"));
    }

    #[test]
    fn test_going_home_loses() {
        let (ending, text, _) = play(&["y", "Ari", "sword", "home"]);

        assert_eq!(ending.unwrap(), Ending { won: false, score: -970 });
        assert!(text.contains("crushed by an asteroid"));
    }

    #[test]
    fn test_fleeing_loses() {
        let (ending, text, _) = play(&["y", "Ari", "magic", "east", "n"]);

        assert_eq!(ending.unwrap(), Ending { won: false, score: -420 });
        assert!(text.contains("You fled and ended up in the dark cave..."));
    }

    #[test]
    fn test_invalid_answers_reprompt() {
        let (ending, text, script) =
            play(&["maybe", " Y ", "Ari", "axe", "Magic", "north", "east", "?", "y"]);

        assert!(ending.unwrap().won);
        assert!(text.contains("Please enter 'y' or 'n'."));
        assert!(text.contains("Please choose one of: Magic, Sword"));
        assert!(text.contains("Please choose one of: East, West, Home"));
        let name_prompts = script
            .prompts
            .iter()
            .filter(|p| p.as_str() == "Do you want to pick a name? (y/n): ")
            .count();
        assert_eq!(name_prompts, 2);
    }

    #[test]
    fn test_blank_name_uses_default() {
        let (_, text, _) = play(&["y", "   ", "magic", "west"]);
        assert!(text.contains("Welcome to Faefolk world of magic Nameless One!"));
    }

    #[test]
    fn test_scores_are_styled() {
        let (_, text, _) = play(&["y", "Ari", "magic", "west"]);

        assert!(text.starts_with("\x1b[1;35m█▓▒░░ Welcome to: Reborn in a New World ░░▒▓█\x1b[0m\n"));
        assert!(text.contains("\x1b[1;33m\t[Current Score: 0]\x1b[0m\n"));
        assert!(text.contains("\x1b[1;33m\t[Current Score: 10]\x1b[0m\n"));
        assert!(text.contains("\x1b[1;33m\t[Current Score: 30]\x1b[0m\n"));
        assert!(text.contains("\x1b[1;33m\t[Current Score: -470]\x1b[0m\n"));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let (ending, _, _) = play(&["y"]);
        let err = ending.unwrap_err();
        assert_eq!(err.downcast_ref::<PromptError>(), Some(&PromptError::Closed));
    }

    #[test]
    fn test_each_run_starts_fresh() {
        let (first, _, _) = play(&["y", "Ari", "magic", "east", "y"]);
        let (second, _, _) = play(&["y", "Ari", "magic", "east", "y"]);
        assert_eq!(first.unwrap(), second.unwrap());
    }
}
