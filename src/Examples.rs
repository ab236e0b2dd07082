pub mod reaction_examples;
