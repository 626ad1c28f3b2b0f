pub mod energyscore;
