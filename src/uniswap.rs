// src/uniswap.rs
use ethers::types::{Address, U256};

use crate::client::ChainClient;
use crate::error::{Result, SwapRequestError};

const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;

pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

// sqrtPriceX96 = sqrt(token1 / token0) * 2^96 in raw units. Prices are token1
// in units of token0, decimals applied. f64 is fine for display and limits
pub fn sqrt_x96_to_price(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> Result<f64> {
    let sqrt_price = u256_to_f64(sqrt_price_x96)? / Q96;
    let raw_price = sqrt_price * sqrt_price;
    if raw_price == 0.0 {
        return Err(SwapRequestError::InvalidParameters(
            "sqrtPriceX96 must be non-zero".to_string(),
        ));
    }

    Ok(10f64.powi(decimals1.into()) / (raw_price * 10f64.powi(decimals0.into())))
}

pub fn price_to_sqrt_x96(price: f64, decimals0: u8, decimals1: u8) -> Result<U256> {
    if !price.is_finite() || price <= 0.0 {
        return Err(SwapRequestError::InvalidParameters(format!(
            "price must be positive, got {}",
            price
        )));
    }

    let raw_price = 10f64.powi(decimals1.into()) / (price * 10f64.powi(decimals0.into()));
    f64_to_u256(raw_price.sqrt() * Q96)
}

pub async fn pair_sqrt_x96_to_price<C: ChainClient + ?Sized>(
    client: &C,
    token_a: Address,
    token_b: Address,
    sqrt_price_x96: U256,
) -> Result<f64> {
    let (decimals0, decimals1) = pair_decimals(client, token_a, token_b).await?;
    sqrt_x96_to_price(sqrt_price_x96, decimals0, decimals1)
}

pub async fn pair_price_to_sqrt_x96<C: ChainClient + ?Sized>(
    client: &C,
    token_a: Address,
    token_b: Address,
    price: f64,
) -> Result<U256> {
    let (decimals0, decimals1) = pair_decimals(client, token_a, token_b).await?;
    price_to_sqrt_x96(price, decimals0, decimals1)
}

async fn pair_decimals<C: ChainClient + ?Sized>(
    client: &C,
    token_a: Address,
    token_b: Address,
) -> Result<(u8, u8)> {
    let (token0, token1) = sort_tokens(token_a, token_b);
    let decimals0 = client.decimals(token0).await?;
    let decimals1 = client.decimals(token1).await?;
    Ok((decimals0, decimals1))
}

fn u256_to_f64(value: U256) -> Result<f64> {
    value
        .to_string()
        .parse()
        .map_err(|_| SwapRequestError::InvalidParameters(format!("{} is not a number", value)))
}

fn f64_to_u256(value: f64) -> Result<U256> {
    U256::from_dec_str(&format!("{:.0}", value.trunc())).map_err(|_| {
        SwapRequestError::InvalidParameters(format!("{} does not fit in uint256", value))
    })
}
