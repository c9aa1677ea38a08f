use crate::enums::TokenRef;
use primitive_types::H160;
use serde::{Deserialize, Serialize};

/// On-chain address of an account, token or contract.
pub type Address = H160;

/// Token identity bound to an on-chain address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// The two tokens of a pool instance. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token1: Token,
    pub token2: Token,
}

impl TokenPair {
    pub fn new(token1: Token, token2: Token) -> Self {
        Self { token1, token2 }
    }

    pub fn get(&self, token: TokenRef) -> &Token {
        match token {
            TokenRef::Token1 => &self.token1,
            TokenRef::Token2 => &self.token2,
        }
    }

    pub fn address_of(&self, token: TokenRef) -> Address {
        self.get(token).address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_lookup() {
        let pair = TokenPair::new(
            Token::new(Address::repeat_byte(1), "TK1", 18),
            Token::new(Address::repeat_byte(2), "TK2", 18),
        );
        assert_eq!(pair.address_of(TokenRef::Token2), Address::repeat_byte(2));
        assert_eq!(pair.get(TokenRef::Token1).symbol, "TK1");
    }
}
