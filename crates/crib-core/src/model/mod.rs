pub mod deck;
pub mod hand;
pub mod layout;
pub mod moves;
pub mod pile;
pub mod rank;
pub mod score;
