//! Solidity bindings for the Safe proxy factory and singleton.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface SafeProxyFactory {
        event ProxyCreation(address indexed proxy, address singleton);

        function createProxyWithNonce(address _singleton, bytes memory initializer, uint256 saltNonce)
            external
            returns (address proxy);

        function proxyCreationCode() external pure returns (bytes memory);
    }

    interface Safe {
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;
    }
}

/// v1.3.0 factories emit the proxy address unindexed in the log data.
pub mod legacy {
    alloy::sol! {
        event ProxyCreation(address proxy, address singleton);
    }
}
