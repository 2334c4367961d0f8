//! Protocol Tests
//!
//! Reply decoding and command encoding, without a network.

mod decoder_tests;
