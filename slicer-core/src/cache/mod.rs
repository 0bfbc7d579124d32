//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod filecache;
pub mod regional;

#[cfg(test)]
mod filecache_test;
#[cfg(test)]
mod regional_test;

pub use self::filecache::Filecache;
pub use self::regional::{CacheStatus, RegionalCache};
